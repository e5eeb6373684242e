//! # Locus Utilities
//!
//! Logging setup shared by hosts of the locus crates.
//!
//! `locus-core` only emits `tracing` events; installing a subscriber is left to
//! the embedding debugger, which can use the helpers here.

pub mod logging;

pub use logging::{
    init_logging, init_logging_to_file, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard,
};
pub use tracing::{debug, error, info, trace, warn};
