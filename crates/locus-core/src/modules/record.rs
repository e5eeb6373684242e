//! Module records.

use std::fmt;
use std::sync::Arc;

use crate::error::{LocusError, LocusResult};
use crate::symbols::SymbolReader;
use crate::target::TargetModule;
use crate::types::{Address, ModuleIdentity};

/// Whether a symbol provider is attached to a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolStatus
{
    /// Symbols loaded; location queries work.
    Loaded,
    /// Loading was attempted and failed, or the module kind is unsupported
    /// (dynamic and in-memory modules).
    NotFound,
    /// The load policy rejected the module.
    Skipped,
}

impl fmt::Display for SymbolStatus
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            SymbolStatus::Loaded => "Symbols loaded.",
            SymbolStatus::NotFound => "Symbols not found.",
            SymbolStatus::Skipped => "Skipped loading symbols.",
        };
        write!(f, "{label}")
    }
}

/// Static facts about a tracked module, computed once at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo
{
    /// Mapping address; the registry key.
    pub base_address: Address,
    /// Mapped image size in bytes.
    pub size: u32,
    /// Module path as seen from the debugger process.
    pub path: String,
    /// File-name component of `path`.
    pub name: String,
    /// Module version id.
    pub identity: ModuleIdentity,
    /// `identity` in its canonical string form.
    pub id: String,
    pub symbol_status: SymbolStatus,
}

impl ModuleInfo
{
    /// Whether `address` lies inside the mapped image.
    pub fn contains(&self, address: Address) -> bool
    {
        self.base_address.range_contains(u64::from(self.size), address)
    }
}

/// Owned snapshot of a tracked module returned by registry lookups.
///
/// Holds its own clone of the module handle, so it stays usable after the
/// registry lock is released (and even after the module is unregistered).
#[derive(Clone)]
pub struct LoadedModule
{
    pub info: ModuleInfo,
    pub handle: Arc<dyn TargetModule>,
}

impl fmt::Debug for LoadedModule
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("LoadedModule").field("info", &self.info).finish_non_exhaustive()
    }
}

/// One registry entry: facts, module handle, and (maybe) a symbol reader.
///
/// Invariant: `symbols` is `Some` exactly when `info.symbol_status` is
/// [`SymbolStatus::Loaded`].
pub struct ModuleRecord
{
    info: ModuleInfo,
    symbols: Option<SymbolReader>,
    handle: Arc<dyn TargetModule>,
}

impl ModuleRecord
{
    pub(crate) fn new(mut info: ModuleInfo, symbols: Option<SymbolReader>, handle: Arc<dyn TargetModule>) -> Self
    {
        let symbols = symbols.filter(SymbolReader::is_loaded);
        match (&symbols, info.symbol_status) {
            (Some(_), _) => info.symbol_status = SymbolStatus::Loaded,
            (None, SymbolStatus::Loaded) => info.symbol_status = SymbolStatus::NotFound,
            (None, _) => {}
        }
        Self { info, symbols, handle }
    }

    pub fn info(&self) -> &ModuleInfo
    {
        &self.info
    }

    pub fn handle(&self) -> &Arc<dyn TargetModule>
    {
        &self.handle
    }

    pub fn symbol_status(&self) -> SymbolStatus
    {
        self.info.symbol_status
    }

    pub fn has_symbols(&self) -> bool
    {
        self.symbols.is_some()
    }

    /// The module's symbol reader.
    ///
    /// ## Errors
    ///
    /// `ProviderUnavailable` if symbols were skipped or failed to load.
    pub(crate) fn symbols(&self) -> LocusResult<&SymbolReader>
    {
        self.symbols.as_ref().ok_or_else(|| {
            LocusError::ProviderUnavailable(format!("{} ({})", self.info.name, self.info.symbol_status))
        })
    }

    pub(crate) fn snapshot(&self) -> LoadedModule
    {
        LoadedModule {
            info: self.info.clone(),
            handle: self.handle.clone(),
        }
    }
}

impl fmt::Debug for ModuleRecord
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("ModuleRecord")
            .field("info", &self.info)
            .field("symbols", &self.symbols)
            .finish_non_exhaustive()
    }
}
