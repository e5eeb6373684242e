//! # Module Registry
//!
//! Authoritative table of the modules loaded in the debuggee, keyed by base
//! address, each with its symbol reader (if symbols were loaded).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use locus_core::modules::ModuleRegistry;
//! use locus_core::symbols::table::SymbolCatalog;
//! use locus_core::symbols::{ProviderEnvironment, SymbolLoadPolicy};
//! # fn module_from_load_event() -> Arc<dyn locus_core::target::TargetModule> { unimplemented!() }
//!
//! let environment = Arc::new(ProviderEnvironment::new(Arc::new(SymbolCatalog::new())));
//! let registry = ModuleRegistry::new(environment);
//! let policy = SymbolLoadPolicy::from_env();
//!
//! // On every module-load notification:
//! let info = registry.register(module_from_load_event(), |path| policy.should_load(path))?;
//! println!("{} at {}: {}", info.name, info.base_address, info.symbol_status);
//! # Ok::<(), locus_core::error::LocusError>(())
//! ```
//!
//! ## Thread Safety
//!
//! The registry is shared between the thread delivering module-load events
//! and the threads answering breakpoint and stepping requests. A single
//! `Mutex` guards the table; every operation, lookups included, holds it for
//! its whole duration, so a lookup that starts after `register` returned always
//! sees the new module. Symbol loading itself runs outside the lock.

pub mod path;
pub mod record;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

pub use record::{LoadedModule, ModuleInfo, ModuleRecord, SymbolStatus};

use crate::error::{LocusError, LocusResult};
use crate::resolver::LocationResolver;
use crate::symbols::{ModuleImage, ProviderEnvironment, SymbolReader};
use crate::target::{ModuleMetadata, TargetFrame, TargetModule, TargetValue};
use crate::types::{Address, MethodToken};

/// A local variable's name, IL scope, and current value.
#[derive(Debug, Clone)]
pub struct NamedLocal
{
    pub name: String,
    pub value: Arc<dyn TargetValue>,
    pub il_start: u32,
    pub il_end: u32,
}

/// Concurrency-safe `base address -> module record` table.
pub struct ModuleRegistry
{
    environment: Arc<ProviderEnvironment>,
    records: Mutex<HashMap<Address, ModuleRecord>>,
}

impl ModuleRegistry
{
    /// Create an empty registry that obtains providers from `environment`.
    pub fn new(environment: Arc<ProviderEnvironment>) -> Self
    {
        Self {
            environment,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn environment(&self) -> &Arc<ProviderEnvironment>
    {
        &self.environment
    }

    /// Location queries over this registry.
    pub fn resolver(&self) -> LocationResolver<'_>
    {
        LocationResolver::new(self)
    }

    /// Lock the table. A panic in another holder does not leave the map in a
    /// torn state (every mutation is a single insert/remove), so poisoning is
    /// ignored.
    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<Address, ModuleRecord>>
    {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track a newly loaded module.
    ///
    /// This method:
    /// 1. Reads the module's metadata, identity, path, base address, and size
    /// 2. Asks `should_load_symbols(path)` whether to attach a provider
    /// 3. Loads symbols (outside the registry lock)
    /// 4. Reports the module's Just-My-Code status to the target
    /// 5. Inserts the record
    ///
    /// Dynamic and in-memory modules are registered with
    /// [`SymbolStatus::NotFound`] without consulting the provider.
    ///
    /// ## Errors
    ///
    /// - `MetadataUnavailable`: the module has no readable metadata scope;
    ///   nothing is inserted
    /// - `DuplicateModule`: a module is already tracked at this base address;
    ///   the existing record is kept
    /// - `Target`: the module handle failed to report its path, base, or size
    pub fn register<F>(&self, module: Arc<dyn TargetModule>, should_load_symbols: F) -> LocusResult<ModuleInfo>
    where
        F: Fn(&str) -> bool,
    {
        let metadata = module.metadata().map_err(into_metadata_error)?;
        let identity = metadata.module_version_id().map_err(into_metadata_error)?;
        let path = path::module_path(module.as_ref())?;
        let name = path::file_name(&path).to_string();
        let base_address = module.base_address()?;
        let size = module.size()?;

        if self.lock().contains_key(&base_address) {
            warn!("Module {name} reported at {base_address}, which is already tracked");
            return Err(LocusError::DuplicateModule(base_address));
        }

        let (symbol_status, symbols) = if should_load_symbols(&path) {
            let image = ModuleImage {
                path: path.clone(),
                base_address,
                size,
            };
            self.load_symbols(module.as_ref(), metadata.as_ref(), &image)
        } else {
            (SymbolStatus::Skipped, None)
        };

        if let Err(err) = module.set_just_my_code(symbol_status == SymbolStatus::Loaded) {
            warn!("Failed to set Just-My-Code status for {name}: {err}");
        }

        let info = ModuleInfo {
            base_address,
            size,
            path,
            name,
            identity,
            id: identity.to_string(),
            symbol_status,
        };

        let record = ModuleRecord::new(info, symbols, module);
        let info = record.info().clone();
        match self.lock().entry(base_address) {
            Entry::Occupied(_) => {
                warn!("Module {} raced another registration at {base_address}", info.name);
                return Err(LocusError::DuplicateModule(base_address));
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }

        info!("Registered module {} at {} ({})", info.name, info.base_address, info.symbol_status);
        Ok(info)
    }

    fn load_symbols(
        &self,
        module: &dyn TargetModule,
        metadata: &dyn ModuleMetadata,
        image: &ModuleImage,
    ) -> (SymbolStatus, Option<SymbolReader>)
    {
        let unsupported = module.is_dynamic().unwrap_or(true) || module.is_in_memory().unwrap_or(true);
        if unsupported {
            debug!("Not loading symbols for dynamic or in-memory module {}", image.path);
            return (SymbolStatus::NotFound, None);
        }

        let provider = match self.environment.create_provider() {
            Ok(provider) => provider,
            Err(err) => {
                debug!("No symbol provider for {}: {err}", image.path);
                return (SymbolStatus::NotFound, None);
            }
        };

        let mut reader = SymbolReader::new(provider);
        match reader.load(metadata, image) {
            Ok(()) => (SymbolStatus::Loaded, Some(reader)),
            Err(err) => {
                debug!("Failed to load symbols for {}: {err}", image.path);
                (SymbolStatus::NotFound, None)
            }
        }
    }

    /// Stop tracking the module at `base_address` (module unload).
    ///
    /// The record's symbol reader is disposed and its module handle released.
    pub fn unregister(&self, base_address: Address) -> LocusResult<ModuleInfo>
    {
        let record = self
            .lock()
            .remove(&base_address)
            .ok_or_else(|| LocusError::NotFound(format!("no module at {base_address}")))?;
        let info = record.info().clone();
        drop(record);
        info!("Unregistered module {} at {}", info.name, info.base_address);
        Ok(info)
    }

    pub fn find_by_address(&self, base_address: Address) -> Option<LoadedModule>
    {
        self.lock().get(&base_address).map(ModuleRecord::snapshot)
    }

    /// First module whose file name equals `name` exactly.
    pub fn find_by_name(&self, name: &str) -> Option<LoadedModule>
    {
        self.lock()
            .values()
            .find(|record| record.info().name == name)
            .map(ModuleRecord::snapshot)
    }

    /// Module whose mapped image contains `address`.
    pub fn find_containing(&self, address: Address) -> Option<LoadedModule>
    {
        self.lock()
            .values()
            .find(|record| record.info().contains(address))
            .map(ModuleRecord::snapshot)
    }

    /// Visit every record until the visitor fails.
    ///
    /// The registry lock is held for the whole walk: the visitor must not call
    /// back into the registry. Iteration order is unspecified.
    pub fn for_each<F>(&self, mut visitor: F) -> LocusResult<()>
    where
        F: FnMut(&ModuleRecord) -> LocusResult<()>,
    {
        for record in self.lock().values() {
            visitor(record)?;
        }
        Ok(())
    }

    /// Facts about every tracked module.
    pub fn snapshot(&self) -> Vec<ModuleInfo>
    {
        self.lock().values().map(|record| record.info().clone()).collect()
    }

    pub fn len(&self) -> usize
    {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.lock().is_empty()
    }

    /// Drop every record (process detach or exit).
    ///
    /// Readers are disposed after the lock is released; by the time this
    /// returns no handle from a cleared record is reachable.
    pub fn clear(&self)
    {
        let drained = std::mem::take(&mut *self.lock());
        let count = drained.len();
        drop(drained);
        info!("Cleared {count} module(s)");
    }

    /// Run `query` against the symbol reader of the module at `base_address`,
    /// holding the registry lock.
    pub(crate) fn with_symbols<T, F>(&self, base_address: Address, query: F) -> LocusResult<T>
    where
        F: FnOnce(&SymbolReader) -> LocusResult<T>,
    {
        let records = self.lock();
        let record = records
            .get(&base_address)
            .ok_or_else(|| LocusError::NotFound(format!("no module at {base_address}")))?;
        query(record.symbols()?)
    }

    /// Name, scope, and value of local slot `local_index` in `frame`.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: the module is untracked, the provider knows no such local,
    ///   or the frame has no value for the slot
    /// - `ProviderUnavailable`: the module has no symbols
    pub fn named_local_variable(
        &self,
        module: &dyn TargetModule,
        frame: &dyn TargetFrame,
        method: MethodToken,
        local_index: u32,
    ) -> LocusResult<NamedLocal>
    {
        let base_address = module.base_address()?;
        let scope = self.with_symbols(base_address, |symbols| {
            Ok(symbols.local_variable(frame, method, local_index)?)
        })?;

        let value = frame
            .local_variable(local_index)?
            .ok_or_else(|| LocusError::NotFound(format!("value of local {local_index} in {method}")))?;

        Ok(NamedLocal {
            name: scope.name,
            value,
            il_start: scope.il_start,
            il_end: scope.il_end,
        })
    }
}

impl fmt::Debug for ModuleRegistry
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("ModuleRegistry")
            .field("environment", &self.environment)
            .field("modules", &self.records.try_lock().map(|records| records.len()).ok())
            .finish()
    }
}

fn into_metadata_error(err: LocusError) -> LocusError
{
    match err {
        LocusError::MetadataUnavailable(_) => err,
        other => LocusError::MetadataUnavailable(other.to_string()),
    }
}
