//! # Error Types
//!
//! General error handling for module tracking and location resolution.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

use crate::symbols::ProviderError;
use crate::types::Address;

/// Main error type for registry and resolver operations
///
/// Most variants are expected, non-fatal outcomes: a debugger front end that
/// receives `NotFound` shows "no source available" and carries on. Only
/// `DuplicateModule` indicates a broken load/unload ordering in the caller.
///
/// ## Error Categories
///
/// 1. **Lookup errors**: NotFound, NoActiveFrame
/// 2. **Symbol errors**: ProviderUnavailable
/// 3. **Module errors**: MetadataUnavailable, DuplicateModule
/// 4. **Marshaling errors**: AllocationFailure
/// 5. **Target errors**: Target (failures reported by the target-control layer)
#[derive(Error, Debug)]
pub enum LocusError
{
    /// No module, record, or line mapping matches the query
    ///
    /// This is the normal answer for a breakpoint in a file that no loaded
    /// module was compiled from, or a frame inside code without symbols.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The module has no symbol provider attached
    ///
    /// Either the provider environment failed to initialize, symbols were
    /// skipped by policy, or loading them failed. The module is still tracked
    /// and can be enumerated, it just cannot answer location queries.
    #[error("Symbol provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The module handle could not yield the metadata needed to register it
    #[error("Module metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// A string or buffer could not be allocated while marshaling a result
    ///
    /// Fatal to the single call only.
    #[error("Allocation failed: {0}")]
    AllocationFailure(String),

    /// A module is already registered at this base address
    ///
    /// Module load and unload notifications are ordered, so this means an
    /// unload was missed. The existing record is kept.
    #[error("Module already registered at {0}")]
    DuplicateModule(Address),

    /// The thread has no active frame to step from
    #[error("Thread has no active frame")]
    NoActiveFrame,

    /// The target-control layer failed to answer a query
    ///
    /// Examples:
    /// - The module was unloaded while we were inspecting it
    /// - The frame is not an IL frame
    /// - The process has exited
    #[error("Target error: {0}")]
    Target(String),
}

impl From<ProviderError> for LocusError
{
    fn from(err: ProviderError) -> Self
    {
        match err {
            ProviderError::NotInitialized | ProviderError::InvalidHandle => LocusError::ProviderUnavailable(err.to_string()),
            ProviderError::OutOfMemory(what) => LocusError::AllocationFailure(what),
            ProviderError::NoSymbols(_) | ProviderError::NoMapping(_) | ProviderError::HiddenLine | ProviderError::Failed(_) => {
                LocusError::NotFound(err.to_string())
            }
        }
    }
}

/// Convenience type alias for `Result<T, LocusError>`
///
/// ```rust
/// use locus_core::error::LocusResult;
/// fn foo() -> LocusResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type LocusResult<T> = std::result::Result<T, LocusError>;
