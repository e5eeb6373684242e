//! # Table Provider
//!
//! A [`SymbolProvider`] over sequence-point tables that were decoded ahead of
//! time.
//!
//! Hosts that already have a module's debug information in hand (decoded by
//! an external tool, cached from a previous session, or written by a test)
//! put it in a [`SymbolCatalog`] keyed by module file name. The catalog is the
//! [`ProviderHost`]; each provider it creates looks its module up by file name
//! when symbols are loaded.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use locus_core::symbols::table::{MethodSymbols, ModuleSymbols, SymbolCatalog};
//! use locus_core::symbols::ProviderEnvironment;
//! use locus_core::types::{MethodToken, SequencePoint};
//!
//! let catalog = Arc::new(SymbolCatalog::new());
//! let mut symbols = ModuleSymbols::new();
//! symbols.add_method(MethodSymbols::new(
//!     MethodToken::new(0x0600_0001),
//!     vec![SequencePoint::new(0, 10, "/src/Program.cs"), SequencePoint::new(6, 11, "/src/Program.cs")],
//! ));
//! catalog.insert("App.dll", symbols);
//!
//! let environment = ProviderEnvironment::new(catalog.clone());
//! assert!(environment.create_provider().is_ok());
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

use super::{LocalScope, ModuleImage, ProviderError, ProviderHost, ProviderResult, SymbolHandle, SymbolProvider};
use crate::modules::path::file_name;
use crate::target::{ModuleMetadata, TargetFrame};
use crate::types::{Address, MethodToken, SequencePoint, StepRange};

/// Debug information for one local variable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable
{
    pub index: u32,
    pub name: String,
    pub il_start: u32,
    pub il_end: u32,
}

/// Sequence points and locals of one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSymbols
{
    token: MethodToken,
    sequence_points: Vec<SequencePoint>,
    locals: Vec<LocalVariable>,
}

impl MethodSymbols
{
    /// Build a method table. Points are sorted by offset; hidden points are kept
    /// because they still delimit step ranges.
    pub fn new(token: MethodToken, mut sequence_points: Vec<SequencePoint>) -> Self
    {
        sequence_points.sort_by_key(|point| point.offset);
        Self {
            token,
            sequence_points,
            locals: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_local(mut self, index: u32, name: impl Into<String>, il_start: u32, il_end: u32) -> Self
    {
        self.locals.push(LocalVariable {
            index,
            name: name.into(),
            il_start,
            il_end,
        });
        self
    }

    pub fn token(&self) -> MethodToken
    {
        self.token
    }

    fn visible_points(&self) -> impl Iterator<Item = &SequencePoint>
    {
        self.sequence_points.iter().filter(|point| !point.is_hidden())
    }
}

/// All method tables of one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSymbols
{
    methods: BTreeMap<MethodToken, MethodSymbols>,
}

impl ModuleSymbols
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Add (or replace) a method table.
    pub fn add_method(&mut self, method: MethodSymbols)
    {
        self.methods.insert(method.token, method);
    }

    pub fn method(&self, token: MethodToken) -> Option<&MethodSymbols>
    {
        self.methods.get(&token)
    }

    fn method_or_err(&self, token: MethodToken) -> ProviderResult<&MethodSymbols>
    {
        self.method(token)
            .ok_or_else(|| ProviderError::NoMapping(format!("method {token}")))
    }
}

#[derive(Debug, Default)]
struct CatalogState
{
    modules: RwLock<HashMap<String, Arc<ModuleSymbols>>>,
    live_handles: Mutex<HashSet<u64>>,
    next_handle: AtomicU64,
}

impl CatalogState
{
    fn issue_handle(&self) -> ProviderResult<SymbolHandle>
    {
        let raw = self.next_handle.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        let handle = SymbolHandle::from_raw(raw).ok_or_else(|| ProviderError::Failed("symbol handle space exhausted".to_string()))?;
        self.live_handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.raw());
        Ok(handle)
    }

    fn release_handle(&self, handle: SymbolHandle)
    {
        self.live_handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.raw());
    }
}

/// Catalog of pre-decoded module symbols; the host for [`TableProvider`]s.
#[derive(Debug, Default)]
pub struct SymbolCatalog
{
    state: Arc<CatalogState>,
}

impl SymbolCatalog
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Register symbols for the module whose file name is `module_name`
    /// (e.g. `App.dll`). Replaces any previous entry.
    pub fn insert(&self, module_name: impl Into<String>, symbols: ModuleSymbols)
    {
        self.state
            .modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(module_name.into(), Arc::new(symbols));
    }

    /// Number of handles issued by this catalog's providers and not yet disposed.
    pub fn live_handles(&self) -> usize
    {
        self.state
            .live_handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ProviderHost for SymbolCatalog
{
    fn initialize(&self) -> ProviderResult<()>
    {
        Ok(())
    }

    fn create_provider(&self) -> ProviderResult<Box<dyn SymbolProvider>>
    {
        Ok(Box::new(TableProvider {
            catalog: self.state.clone(),
            loaded: None,
        }))
    }
}

/// Provider answering queries from a [`ModuleSymbols`] table.
#[derive(Debug)]
pub struct TableProvider
{
    catalog: Arc<CatalogState>,
    loaded: Option<(SymbolHandle, Arc<ModuleSymbols>)>,
}

impl TableProvider
{
    fn symbols(&self, handle: SymbolHandle) -> ProviderResult<&ModuleSymbols>
    {
        match &self.loaded {
            Some((loaded, symbols)) if *loaded == handle && self.is_live(handle) => Ok(&**symbols),
            _ => Err(ProviderError::InvalidHandle),
        }
    }

    fn is_live(&self, handle: SymbolHandle) -> bool
    {
        self.catalog
            .live_handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&handle.raw())
    }
}

/// Normalize separators so `C:\src\a.cs` and `C:/src/a.cs` compare equal.
fn normalize(path: &str) -> String
{
    path.replace('\\', "/")
}

/// A query matches a document when the full paths agree or, failing that, the
/// file names do.
fn document_matches(document: &str, query: &str) -> bool
{
    let document = normalize(document);
    let query = normalize(query);
    document == query || file_name(&document) == file_name(&query)
}

impl SymbolProvider for TableProvider
{
    fn load_symbols(&mut self, _metadata: &dyn ModuleMetadata, image: &ModuleImage) -> ProviderResult<SymbolHandle>
    {
        let name = file_name(&image.path);
        let symbols = self
            .catalog
            .modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::NoSymbols(image.path.clone()))?;

        let handle = self.catalog.issue_handle()?;
        debug!(module = name, handle = handle.raw(), "table symbols loaded");
        self.loaded = Some((handle, symbols));
        Ok(handle)
    }

    fn resolve_sequence_point(
        &self,
        handle: SymbolHandle,
        file: &str,
        line: u32,
        _module_base: Address,
    ) -> ProviderResult<(MethodToken, u32)>
    {
        let symbols = self.symbols(handle)?;

        // Nearest line at or after the requested one; ties go to the lowest
        // offset, then the lowest method token.
        let mut best: Option<(u32, i32, MethodToken)> = None;
        for method in symbols.methods.values() {
            for point in method.visible_points() {
                if point.start_line < line || !document_matches(&point.document, file) {
                    continue;
                }
                let candidate = (point.start_line, point.offset, method.token);
                match best {
                    Some(current) if current <= candidate => {}
                    _ => best = Some(candidate),
                }
            }
        }

        let (_, offset, token) = best.ok_or_else(|| ProviderError::NoMapping(format!("{file}:{line}")))?;
        let offset = u32::try_from(offset).map_err(|_| ProviderError::Failed(format!("negative IL offset {offset}")))?;
        Ok((token, offset))
    }

    fn line_by_il_offset(&self, handle: SymbolHandle, method: MethodToken, il_offset: u32) -> ProviderResult<(u32, String)>
    {
        let method_symbols = self.symbols(handle)?.method_or_err(method)?;
        method_symbols
            .visible_points()
            .take_while(|point| i64::from(point.offset) <= i64::from(il_offset))
            .last()
            .map(|point| (point.start_line, point.document.clone()))
            .ok_or_else(|| ProviderError::NoMapping(format!("{method}+0x{il_offset:x}")))
    }

    fn step_range(&self, handle: SymbolHandle, il_offset: u32, method: MethodToken) -> ProviderResult<StepRange>
    {
        let method_symbols = self.symbols(handle)?.method_or_err(method)?;
        let ip = i64::from(il_offset);

        let mut start = None;
        let mut end = None;
        for point in &method_symbols.sequence_points {
            if i64::from(point.offset) <= ip {
                start = Some(point.offset);
            } else {
                end = Some(point.offset);
                break;
            }
        }

        let start = start.ok_or_else(|| ProviderError::NoMapping(format!("{method}+0x{il_offset:x}")))?;
        let to_offset = |value: i32| u32::try_from(value).map_err(|_| ProviderError::Failed(format!("negative IL offset {value}")));
        let start = to_offset(start)?;
        let end = match end {
            Some(end) => to_offset(end)?,
            None => start,
        };
        Ok(StepRange::new(start, end))
    }

    fn sequence_points(&self, handle: SymbolHandle, method: MethodToken) -> ProviderResult<Vec<SequencePoint>>
    {
        let method_symbols = self.symbols(handle)?.method_or_err(method)?;
        Ok(method_symbols.visible_points().cloned().collect())
    }

    fn local_variable(
        &self,
        handle: SymbolHandle,
        _frame: &dyn TargetFrame,
        method: MethodToken,
        local_index: u32,
    ) -> ProviderResult<LocalScope>
    {
        let method_symbols = self.symbols(handle)?.method_or_err(method)?;
        method_symbols
            .locals
            .iter()
            .find(|local| local.index == local_index)
            .map(|local| LocalScope {
                name: local.name.clone(),
                il_start: local.il_start,
                il_end: local.il_end,
            })
            .ok_or_else(|| ProviderError::NoMapping(format!("local {local_index} of {method}")))
    }

    fn dispose(&self, handle: SymbolHandle)
    {
        self.catalog.release_handle(handle);
    }
}
