//! # Symbol Providers
//!
//! The capability contract a symbol provider must satisfy, plus the pieces
//! that manage providers on behalf of the registry.
//!
//! A provider turns a module's debug information into line/offset mappings.
//! How it does that (parsing portable debug info in-process, delegating to a
//! hosted helper runtime, reading a pre-decoded table) is hidden behind
//! [`SymbolProvider`]. The registry never talks to a provider directly; it goes
//! through a [`SymbolReader`], which owns the provider together with the
//! handle returned from [`SymbolProvider::load_symbols`].
//!
//! ## Components
//!
//! - [`SymbolProvider`]: per-module capability (external)
//! - [`ProviderHost`]: process-wide factory and one-time initialization (external)
//! - [`ProviderEnvironment`]: attempt-once latch around a host
//! - [`SymbolReader`]: owned provider + handle, contract checks, disposal
//! - [`SymbolLoadPolicy`]: default "should we load symbols for this module" predicate
//! - [`table`]: a provider over pre-decoded sequence-point tables
//!
//! ## Thread Safety
//!
//! Providers must be `Send + Sync`. Once a module is registered its reader
//! may be queried from any thread holding the registry lock, and adapters that
//! delegate to a helper runtime must serialize internally if that runtime
//! cannot take concurrent calls.

pub mod environment;
pub mod policy;
pub mod reader;
pub mod table;

use std::num::NonZeroU64;

use thiserror::Error;

pub use environment::ProviderEnvironment;
pub use policy::SymbolLoadPolicy;
pub use reader::SymbolReader;

use crate::target::{ModuleMetadata, TargetFrame};
use crate::types::{Address, MethodToken, SequencePoint, StepRange};

/// Failure reported by a symbol provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError
{
    /// The provider environment never initialized (or failed to).
    #[error("symbol provider environment is not initialized")]
    NotInitialized,

    /// No debug information exists for the module.
    #[error("no symbols for {0}")]
    NoSymbols(String),

    /// The query has no answer in the module's debug information.
    #[error("no mapping for {0}")]
    NoMapping(String),

    /// The location resolved to compiler-generated code.
    #[error("location maps to a hidden line")]
    HiddenLine,

    /// The handle is not (or no longer) known to the provider.
    #[error("invalid symbol handle")]
    InvalidHandle,

    /// The provider could not allocate a result buffer.
    #[error("out of memory while marshaling {0}")]
    OutOfMemory(String),

    /// Any other provider-side failure.
    #[error("symbol provider failed: {0}")]
    Failed(String),
}

/// Convenience type alias for `Result<T, ProviderError>`
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Opaque token a provider hands out when it loads a module's symbols.
///
/// Only valid while the [`SymbolReader`] that received it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolHandle(NonZeroU64);

impl SymbolHandle
{
    /// Wrap a raw handle value; `0` is never a valid handle.
    pub fn from_raw(raw: u64) -> Option<Self>
    {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn raw(self) -> u64
    {
        self.0.get()
    }
}

/// Where and how a module image is mapped, as passed to
/// [`SymbolProvider::load_symbols`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleImage
{
    /// Module path after `/proc/self` rewriting.
    pub path: String,
    /// Image base in the debuggee.
    pub base_address: Address,
    /// Image size in bytes.
    pub size: u32,
}

/// Name and live IL range of a local variable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalScope
{
    pub name: String,
    pub il_start: u32,
    pub il_end: u32,
}

/// Per-module symbol capability.
///
/// Every query except `load_symbols` receives the handle that `load_symbols`
/// returned. Implementations must filter hidden sequence points
/// ([`crate::types::HIDDEN_LINE`]) out of every answer.
pub trait SymbolProvider: Send + Sync
{
    /// Load debug information for one module. Called at most once per provider.
    fn load_symbols(&mut self, metadata: &dyn ModuleMetadata, image: &ModuleImage) -> ProviderResult<SymbolHandle>;

    /// Map a source location to the nearest breakable location at or after it.
    ///
    /// Returns the method containing that location and its IL offset.
    fn resolve_sequence_point(
        &self,
        handle: SymbolHandle,
        file: &str,
        line: u32,
        module_base: Address,
    ) -> ProviderResult<(MethodToken, u32)>;

    /// Map an IL offset back to `(line, document path)`.
    fn line_by_il_offset(&self, handle: SymbolHandle, method: MethodToken, il_offset: u32) -> ProviderResult<(u32, String)>;

    /// IL range of the source line containing `il_offset`.
    ///
    /// A zero-width range means the provider cannot narrow it further.
    fn step_range(&self, handle: SymbolHandle, il_offset: u32, method: MethodToken) -> ProviderResult<StepRange>;

    /// All sequence points of a method, ordered by ascending offset.
    fn sequence_points(&self, handle: SymbolHandle, method: MethodToken) -> ProviderResult<Vec<SequencePoint>>;

    /// Name and scope of a local variable slot.
    fn local_variable(
        &self,
        handle: SymbolHandle,
        frame: &dyn TargetFrame,
        method: MethodToken,
        local_index: u32,
    ) -> ProviderResult<LocalScope>;

    /// Release everything associated with `handle`.
    fn dispose(&self, _handle: SymbolHandle) {}
}

/// Process-wide provider factory.
pub trait ProviderHost: Send + Sync
{
    /// Set up whatever the providers need (load a helper runtime, bind entry
    /// points, ...). Called at most once per process through
    /// [`ProviderEnvironment`].
    fn initialize(&self) -> ProviderResult<()>;

    /// Create a fresh, unloaded provider for one module.
    fn create_provider(&self) -> ProviderResult<Box<dyn SymbolProvider>>;
}
