//! # Logging Utilities
//!
//! `tracing` subscriber setup for hosts embedding locus.
//!
//! Console output goes to stdout, pretty or JSON, with RFC 3339 timestamps.
//! A log file can be added next to it, or used on its own when the host owns
//! stdout (a debug adapter speaking its protocol over stdio, for instance).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use locus_utils::init_logging;
//!
//! // Keep the guard alive for as long as logs should be written.
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Debugger backend started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: filter directives (e.g., `RUST_LOG=debug`, `RUST_LOG=locus_core=trace`)
//! - `LOCUS_LOG_FORMAT`: `json` or `pretty` (default: `pretty`)
//! - `LOCUS_LOG_FILE`: also write to this file, rotated daily
//!
//! ## Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use locus_utils::{LogLevel, init_logging_to_file};
//!
//! // stdout belongs to the protocol; log to ~/.locus/<date>-locus.log instead.
//! let (path, _guard) = init_logging_to_file(Path::new("/home/me/.locus"), Some(LogLevel::Debug))
//!     .expect("Failed to initialize logging");
//! eprintln!("logging to {}", path.display());
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs, io};

use chrono::{NaiveDate, Utc};
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const FORMAT_VAR: &str = "LOCUS_LOG_FORMAT";
const FILE_VAR: &str = "LOCUS_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Human-readable, colored on the console
    #[default]
    Pretty,
    /// One JSON object per event, with span context
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.trim().to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Keeps the background file writer alive.
///
/// Buffered file output is flushed when the guard is dropped; drop it only at
/// shutdown.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard
{
    _file_writer: Option<WorkerGuard>,
}

/// Initialize logging from the environment.
///
/// Reads `RUST_LOG` (default `info`), `LOCUS_LOG_FORMAT`, and `LOCUS_LOG_FILE`.
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `LOCUS_LOG_FORMAT` holds an unknown format
/// - The `LOCUS_LOG_FILE` directory cannot be created
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    let format = match env::var(FORMAT_VAR) {
        Ok(value) => value.parse()?,
        Err(_) => LogFormat::default(),
    };
    let log_file = env::var(FILE_VAR).ok().map(PathBuf::from);
    install(format, None, log_file.as_deref())
}

/// Initialize console logging (plus `LOCUS_LOG_FILE`, if set) with an explicit
/// level and format. `level` overrides `RUST_LOG`.
///
/// ## Example
///
/// ```rust,no_run
/// use locus_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file logging fails.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    let log_file = env::var(FILE_VAR).ok().map(PathBuf::from);
    install(format, Some(level), log_file.as_deref())
}

/// Initialize file-only logging under `directory`, leaving stdout untouched.
///
/// The file is named `<YYYY-MM-DD>-locus.log` (UTC date) and is not rotated.
/// Returns the file's path. `level` overrides `RUST_LOG`.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the directory or
/// file cannot be created.
pub fn init_logging_to_file(directory: &Path, level: Option<LogLevel>) -> Result<(PathBuf, LoggingGuard), LoggingError>
{
    fs::create_dir_all(directory)?;
    let file_name = log_file_name(Utc::now().date_naive());
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&file_name)
        .build(directory)
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = format_layer(LogFormat::Pretty, writer, false).with_filter(env_filter(level));
    Registry::default()
        .with(file_layer)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    Ok((
        directory.join(file_name),
        LoggingGuard {
            _file_writer: Some(guard),
        },
    ))
}

fn install(format: LogFormat, level: Option<LogLevel>, log_file: Option<&Path>) -> Result<LoggingGuard, LoggingError>
{
    let console_layer = format_layer(format, io::stdout, true).with_filter(env_filter(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let directory = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let file_name = path
                .file_name()
                .ok_or_else(|| LoggingError::InitializationFailed(format!("{} is not a file path", path.display())))?;
            fs::create_dir_all(directory)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(file_name.to_string_lossy())
                .build(directory)
                .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = format_layer(format, writer, false).with_filter(env_filter(level));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    Ok(LoggingGuard { _file_writer: guard })
}

/// One formatting layer with the fields every locus log line carries.
fn format_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339());

    match format {
        LogFormat::Pretty => layer.with_ansi(ansi).boxed(),
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    }
}

/// An explicit level wins; otherwise `RUST_LOG`; otherwise `info`.
fn env_filter(level: Option<LogLevel>) -> EnvFilter
{
    EnvFilter::new(filter_directives(level, env::var("RUST_LOG").ok().as_deref()))
}

fn filter_directives(level: Option<LogLevel>, rust_log: Option<&str>) -> String
{
    match (level, rust_log) {
        (Some(level), _) => Level::from(level).to_string(),
        (None, Some(directives)) if !directives.trim().is_empty() => directives.to_string(),
        (None, _) => Level::INFO.to_string(),
    }
}

fn log_file_name(date: NaiveDate) -> String
{
    format!("{}-locus.log", date.format("%Y-%m-%d"))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    #[error("Invalid log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    #[error("Invalid log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// A global subscriber is already installed, or the file appender failed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("dev").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("prod").unwrap(), LogFormat::Json);
        assert!(matches!(
            LogFormat::from_str("xml"),
            Err(LoggingError::InvalidFormat(value)) if value == "xml"
        ));
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str(" dbg ").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(matches!(LogLevel::from_str("loud"), Err(LoggingError::InvalidLevel(_))));
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_filter_directive_priority()
    {
        assert_eq!(filter_directives(Some(LogLevel::Debug), Some("locus_core=trace")), "DEBUG");
        assert_eq!(filter_directives(None, Some("locus_core=trace")), "locus_core=trace");
        assert_eq!(filter_directives(None, Some("  ")), "INFO");
        assert_eq!(filter_directives(None, None), "INFO");
    }

    #[test]
    fn test_log_file_name_is_dated()
    {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(log_file_name(date), "2026-03-07-locus.log");
    }

    #[test]
    fn test_file_logging_creates_file_and_initializes_once()
    {
        let directory = env::temp_dir().join(format!("locus-logging-{}", std::process::id()));
        let (path, guard) = init_logging_to_file(&directory, Some(LogLevel::Info)).unwrap();
        assert!(path.starts_with(&directory));
        assert!(path.exists());

        let second = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty);
        assert!(matches!(second, Err(LoggingError::InitializationFailed(_))));

        drop(guard);
        let _ = fs::remove_dir_all(&directory);
    }
}
