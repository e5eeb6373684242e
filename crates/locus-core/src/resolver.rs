//! # Location Resolver
//!
//! Source-location queries answered through the [`ModuleRegistry`]:
//!
//! - `(file, line)` to `(module, method, IL offset)`, across every module or
//!   inside one ([`LocationResolver::resolve_anywhere`],
//!   [`LocationResolver::resolve_in_module`])
//! - the current source position of a stopped frame
//!   ([`LocationResolver::current_location`])
//! - the IL range a single step must not leave
//!   ([`LocationResolver::step_range_from_current_ip`])
//!
//! The resolver itself is stateless. Every query holds the registry lock while
//! it talks to a provider, so a module cannot be unloaded (and its symbol
//! handle disposed) in the middle of a query.
//!
//! Provider failures on one module never poison queries against the others:
//! `resolve_anywhere` skips the module, everything else reports `NotFound`.

use tracing::debug;

use crate::error::{LocusError, LocusResult};
use crate::modules::{LoadedModule, ModuleRegistry};
use crate::symbols::{ProviderResult, SymbolReader};
use crate::target::{TargetFrame, TargetModule, TargetThread};
use crate::types::{Address, MethodToken, SequencePoint, StepRange};

/// A breakable location found for a `(file, line)` request.
#[derive(Debug, Clone)]
pub struct ResolvedLocation
{
    /// Module that owns the method.
    pub module: LoadedModule,
    pub method: MethodToken,
    /// Method-relative IL offset of the chosen sequence point.
    pub il_offset: u32,
    /// Document path as recorded in the symbols, which may differ from the
    /// (often relative) path the user asked for.
    pub full_path: String,
}

/// Where a stopped frame is, in source terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLocation
{
    /// IL offset the frame reported.
    pub il_offset: u32,
    /// Sequence point to highlight; `document` holds the symbol file's path.
    pub sequence_point: SequencePoint,
}

/// Location queries over one registry.
#[derive(Debug, Clone, Copy)]
pub struct LocationResolver<'r>
{
    registry: &'r ModuleRegistry,
}

impl<'r> LocationResolver<'r>
{
    pub fn new(registry: &'r ModuleRegistry) -> Self
    {
        Self { registry }
    }

    /// Resolve `(file, line)` in the first module whose symbols can.
    ///
    /// Modules are tried in registry iteration order and the first success
    /// wins. When several modules contain the same document the winner is
    /// unspecified. Modules without symbols are not consulted; a module whose
    /// provider fails is skipped.
    ///
    /// ## Errors
    ///
    /// `NotFound` if no module resolves the location.
    pub fn resolve_anywhere(&self, file: &str, line: u32) -> LocusResult<ResolvedLocation>
    {
        let records = self.registry.lock();
        for record in records.values() {
            let Ok(symbols) = record.symbols() else {
                continue;
            };
            let info = record.info();
            match resolve_with(symbols, info.base_address, file, line) {
                Ok((method, il_offset, full_path)) => {
                    return Ok(ResolvedLocation {
                        module: record.snapshot(),
                        method,
                        il_offset,
                        full_path,
                    });
                }
                Err(err) => debug!("{file}:{line} not resolved in {}: {err}", info.name),
            }
        }
        Err(LocusError::NotFound(format!("no module has code at {file}:{line}")))
    }

    /// Resolve `(file, line)` inside one module.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: the module is not tracked, or its provider cannot map the
    ///   location
    /// - `ProviderUnavailable`: the module has no symbols
    pub fn resolve_in_module(&self, module: &dyn TargetModule, file: &str, line: u32) -> LocusResult<ResolvedLocation>
    {
        let base_address = module.base_address()?;
        let records = self.registry.lock();
        let record = records
            .get(&base_address)
            .ok_or_else(|| LocusError::NotFound(format!("no module at {base_address}")))?;
        let (method, il_offset, full_path) = resolve_with(record.symbols()?, base_address, file, line)?;
        Ok(ResolvedLocation {
            module: record.snapshot(),
            method,
            il_offset,
            full_path,
        })
    }

    /// Source position of `frame`.
    ///
    /// The frame's IL offset is matched against the method's sequence points
    /// with [`nearest_sequence_point`]; the point's document is replaced by the
    /// file the provider reports for that exact offset.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: the module is untracked, the offset has no line, or the
    ///   method has no visible sequence points
    /// - `ProviderUnavailable`: the module has no symbols
    /// - `Target`: the frame could not report its method, module, or offset
    pub fn current_location(&self, frame: &dyn TargetFrame) -> LocusResult<FrameLocation>
    {
        let method = frame.method_token()?;
        let base_address = frame.module()?.base_address()?;
        let (il_offset, quality) = frame.il_offset()?;

        let (document, points) = self.registry.with_symbols(base_address, |symbols| {
            let (_, document) = symbols.line_by_il_offset(method, il_offset)?;
            let points = symbols.sequence_points(method)?;
            Ok((document, points))
        })?;

        let offset = i32::try_from(il_offset)
            .map_err(|_| LocusError::NotFound(format!("IL offset 0x{il_offset:x} out of range")))?;
        let mut sequence_point = nearest_sequence_point(&points, offset)
            .cloned()
            .ok_or_else(|| LocusError::NotFound(format!("no sequence points in {method}")))?;
        sequence_point.document = document;

        debug!(
            "{method}+0x{il_offset:x} ({quality:?}) maps to line {}",
            sequence_point.start_line
        );
        Ok(FrameLocation {
            il_offset,
            sequence_point,
        })
    }

    /// IL range of the source line `thread` is stopped on.
    ///
    /// When the provider cannot narrow the range (it comes back zero-width) the
    /// range is widened to the end of the method.
    ///
    /// ## Errors
    ///
    /// - `NoActiveFrame`: the thread has no managed frame
    /// - `NotFound` / `ProviderUnavailable`: as for [`Self::current_location`]
    pub fn step_range_from_current_ip(&self, thread: &dyn TargetThread) -> LocusResult<StepRange>
    {
        let frame = thread.active_frame()?.ok_or(LocusError::NoActiveFrame)?;
        let method = frame.method_token()?;
        let base_address = frame.module()?.base_address()?;
        let (il_offset, _) = frame.il_offset()?;

        let mut range = self
            .registry
            .with_symbols(base_address, |symbols| Ok(symbols.step_range(il_offset, method)?))?;
        if range.is_empty() {
            range.end_offset = frame.il_code_size()?;
        }
        Ok(range)
    }
}

fn resolve_with(
    symbols: &SymbolReader,
    module_base: Address,
    file: &str,
    line: u32,
) -> ProviderResult<(MethodToken, u32, String)>
{
    let (method, il_offset) = symbols.resolve_sequence_point(file, line, module_base)?;
    let (_, full_path) = symbols.line_by_il_offset(method, il_offset)?;
    Ok((method, il_offset, full_path))
}

/// Pick the sequence point to show for `il_offset`.
///
/// `points` must be in ascending offset order. A point exactly at `il_offset`
/// wins; otherwise the last point before it; otherwise the first point.
/// `None` only for an empty table.
pub fn nearest_sequence_point(points: &[SequencePoint], il_offset: i32) -> Option<&SequencePoint>
{
    let mut nearest = points.first()?;
    for point in points {
        if point.offset == il_offset {
            return Some(point);
        }
        if point.offset < il_offset {
            nearest = point;
        } else {
            break;
        }
    }
    Some(nearest)
}
