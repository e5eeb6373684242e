//! Owned provider plus its symbol handle.

use std::fmt;

use tracing::trace;

use super::{LocalScope, ModuleImage, ProviderError, ProviderResult, SymbolHandle, SymbolProvider};
use crate::target::{ModuleMetadata, TargetFrame};
use crate::types::{Address, MethodToken, SequencePoint, StepRange, HIDDEN_LINE};

/// A module's symbol provider, together with the handle it issued.
///
/// The reader is owned by exactly one module record. Dropping it disposes the
/// handle, so a handle can never be used after its record is gone.
pub struct SymbolReader
{
    provider: Box<dyn SymbolProvider>,
    handle: Option<SymbolHandle>,
}

impl SymbolReader
{
    /// Wrap a fresh provider. Queries fail until [`SymbolReader::load`] succeeds.
    pub fn new(provider: Box<dyn SymbolProvider>) -> Self
    {
        Self { provider, handle: None }
    }

    /// Load symbols for a module. One-shot: a second call fails.
    pub fn load(&mut self, metadata: &dyn ModuleMetadata, image: &ModuleImage) -> ProviderResult<()>
    {
        if self.handle.is_some() {
            return Err(ProviderError::Failed(format!("symbols for {} already loaded", image.path)));
        }
        let handle = self.provider.load_symbols(metadata, image)?;
        trace!(handle = handle.raw(), path = %image.path, "symbols loaded");
        self.handle = Some(handle);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool
    {
        self.handle.is_some()
    }

    fn handle(&self) -> ProviderResult<SymbolHandle>
    {
        self.handle.ok_or(ProviderError::InvalidHandle)
    }

    pub fn resolve_sequence_point(&self, file: &str, line: u32, module_base: Address) -> ProviderResult<(MethodToken, u32)>
    {
        self.provider.resolve_sequence_point(self.handle()?, file, line, module_base)
    }

    /// Line and document for an IL offset.
    ///
    /// Line `0` and the hidden line are reported as failures even if the
    /// provider returns them.
    pub fn line_by_il_offset(&self, method: MethodToken, il_offset: u32) -> ProviderResult<(u32, String)>
    {
        let (line, file) = self.provider.line_by_il_offset(self.handle()?, method, il_offset)?;
        if line == HIDDEN_LINE {
            return Err(ProviderError::HiddenLine);
        }
        if line == 0 {
            return Err(ProviderError::NoMapping(format!("{method}+0x{il_offset:x}")));
        }
        Ok((line, file))
    }

    pub fn step_range(&self, il_offset: u32, method: MethodToken) -> ProviderResult<StepRange>
    {
        self.provider.step_range(self.handle()?, il_offset, method)
    }

    pub fn sequence_points(&self, method: MethodToken) -> ProviderResult<Vec<SequencePoint>>
    {
        self.provider.sequence_points(self.handle()?, method)
    }

    pub fn local_variable(&self, frame: &dyn TargetFrame, method: MethodToken, local_index: u32) -> ProviderResult<LocalScope>
    {
        self.provider.local_variable(self.handle()?, frame, method, local_index)
    }
}

impl Drop for SymbolReader
{
    fn drop(&mut self)
    {
        if let Some(handle) = self.handle.take() {
            trace!(handle = handle.raw(), "disposing symbol handle");
            self.provider.dispose(handle);
        }
    }
}

impl fmt::Debug for SymbolReader
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("SymbolReader").field("handle", &self.handle).finish_non_exhaustive()
    }
}
