//! Test doubles for the target-control traits.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use locus_core::error::{LocusError, LocusResult};
use locus_core::modules::path::file_name;
use locus_core::modules::ModuleRegistry;
use locus_core::symbols::table::{MethodSymbols, ModuleSymbols, SymbolCatalog};
use locus_core::symbols::{
    LocalScope, ModuleImage, ProviderEnvironment, ProviderError, ProviderHost, ProviderResult, SymbolHandle,
    SymbolProvider,
};
use locus_core::target::{ModuleMetadata, TargetFrame, TargetModule, TargetThread, TargetValue};
use locus_core::types::{Address, MappingQuality, MethodToken, ModuleIdentity, SequencePoint, StepRange};

pub const MAIN: MethodToken = MethodToken::new(0x0600_0001);
pub const HELPER: MethodToken = MethodToken::new(0x0600_0002);

struct FakeMetadata
{
    identity: ModuleIdentity,
}

impl ModuleMetadata for FakeMetadata
{
    fn module_version_id(&self) -> LocusResult<ModuleIdentity>
    {
        Ok(self.identity)
    }
}

pub struct FakeModule
{
    pub base: Address,
    pub size: u32,
    pub name: String,
    pub pid: u32,
    pub identity: ModuleIdentity,
    pub has_metadata: bool,
    pub dynamic: bool,
    pub in_memory: bool,
    pub fail_jmc: bool,
    jmc_calls: Mutex<Vec<bool>>,
}

impl FakeModule
{
    pub fn new(base: u64, name: &str) -> Self
    {
        Self {
            base: Address::new(base),
            size: 0x1000,
            name: name.to_string(),
            pid: 4242,
            identity: ModuleIdentity::from_u128(u128::from(base)),
            has_metadata: true,
            dynamic: false,
            in_memory: false,
            fail_jmc: false,
            jmc_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn jmc_calls(&self) -> Vec<bool>
    {
        self.jmc_calls.lock().unwrap().clone()
    }

    pub fn shared(self) -> Arc<Self>
    {
        Arc::new(self)
    }
}

impl TargetModule for FakeModule
{
    fn base_address(&self) -> LocusResult<Address>
    {
        Ok(self.base)
    }

    fn size(&self) -> LocusResult<u32>
    {
        Ok(self.size)
    }

    fn name(&self) -> LocusResult<String>
    {
        Ok(self.name.clone())
    }

    fn process_id(&self) -> LocusResult<u32>
    {
        Ok(self.pid)
    }

    fn metadata(&self) -> LocusResult<Arc<dyn ModuleMetadata>>
    {
        if !self.has_metadata {
            return Err(LocusError::MetadataUnavailable(self.name.clone()));
        }
        Ok(Arc::new(FakeMetadata {
            identity: self.identity,
        }))
    }

    fn is_dynamic(&self) -> LocusResult<bool>
    {
        Ok(self.dynamic)
    }

    fn is_in_memory(&self) -> LocusResult<bool>
    {
        Ok(self.in_memory)
    }

    fn set_just_my_code(&self, is_user_code: bool) -> LocusResult<()>
    {
        self.jmc_calls.lock().unwrap().push(is_user_code);
        if self.fail_jmc {
            return Err(LocusError::Target("JMC not supported".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakeValue
{
    pub address: Address,
}

impl TargetValue for FakeValue
{
    fn address(&self) -> LocusResult<Option<Address>>
    {
        Ok(Some(self.address))
    }

    fn size(&self) -> LocusResult<u64>
    {
        Ok(4)
    }
}

#[derive(Clone)]
pub struct FakeFrame
{
    pub method: MethodToken,
    pub module: Arc<dyn TargetModule>,
    pub il_offset: u32,
    pub code_size: u32,
    pub locals: HashMap<u32, Arc<dyn TargetValue>>,
}

impl FakeFrame
{
    pub fn new(module: Arc<dyn TargetModule>, method: MethodToken, il_offset: u32) -> Self
    {
        Self {
            method,
            module,
            il_offset,
            code_size: 0x40,
            locals: HashMap::new(),
        }
    }
}

impl TargetFrame for FakeFrame
{
    fn method_token(&self) -> LocusResult<MethodToken>
    {
        Ok(self.method)
    }

    fn module(&self) -> LocusResult<Arc<dyn TargetModule>>
    {
        Ok(self.module.clone())
    }

    fn il_offset(&self) -> LocusResult<(u32, MappingQuality)>
    {
        Ok((self.il_offset, MappingQuality::Exact))
    }

    fn il_code_size(&self) -> LocusResult<u32>
    {
        Ok(self.code_size)
    }

    fn local_variable(&self, index: u32) -> LocusResult<Option<Arc<dyn TargetValue>>>
    {
        Ok(self.locals.get(&index).cloned())
    }
}

pub struct FakeThread
{
    pub frame: Option<FakeFrame>,
}

impl TargetThread for FakeThread
{
    fn active_frame(&self) -> LocusResult<Option<Box<dyn TargetFrame>>>
    {
        Ok(self
            .frame
            .clone()
            .map(|frame| Box::new(frame) as Box<dyn TargetFrame>))
    }
}

/// `App.dll` with two methods in `/src/app/Program.cs`:
/// `MAIN` at offsets 0/10/20 (lines 10/11/13) and `HELPER` at 0/5 (lines 30/31).
pub fn app_symbols() -> ModuleSymbols
{
    let mut symbols = ModuleSymbols::new();
    symbols.add_method(
        MethodSymbols::new(
            MAIN,
            vec![
                SequencePoint::new(0, 10, "/src/app/Program.cs"),
                SequencePoint::new(10, 11, "/src/app/Program.cs"),
                SequencePoint::new(20, 13, "/src/app/Program.cs"),
            ],
        )
        .with_local(0, "count", 0, 30),
    );
    symbols.add_method(MethodSymbols::new(
        HELPER,
        vec![SequencePoint::new(0, 30, "/src/app/Program.cs"), SequencePoint::new(5, 31, "/src/app/Program.cs")],
    ));
    symbols
}

/// `Lib.dll` with one method in `/src/lib/Util.cs` (lines 3/4).
pub fn lib_symbols() -> ModuleSymbols
{
    let mut symbols = ModuleSymbols::new();
    symbols.add_method(MethodSymbols::new(
        MAIN,
        vec![SequencePoint::new(0, 3, "/src/lib/Util.cs"), SequencePoint::new(6, 4, "/src/lib/Util.cs")],
    ));
    symbols
}

/// A registry backed by a catalog that knows `App.dll` and `Lib.dll`.
pub fn registry() -> (ModuleRegistry, Arc<SymbolCatalog>)
{
    let catalog = Arc::new(SymbolCatalog::new());
    catalog.insert("App.dll", app_symbols());
    catalog.insert("Lib.dll", lib_symbols());
    let environment = Arc::new(ProviderEnvironment::new(catalog.clone()));
    (ModuleRegistry::new(environment), catalog)
}

pub fn load_all(_path: &str) -> bool
{
    true
}

/// How a [`ScriptedHost`] provider answers `resolve_anywhere`-style queries.
#[derive(Debug, Clone)]
pub enum Script
{
    /// Resolves to `method` at `il_offset`, in `document`.
    Resolves
    {
        method: MethodToken,
        il_offset: u32,
        document: String,
    },
    /// `resolve_sequence_point` fails.
    ResolveFails,
    /// `resolve_sequence_point` succeeds but the line lookup that follows fails.
    LineFails,
}

/// Provider host whose answers are scripted per module file name. Records the
/// module name of every `resolve_sequence_point` call, in call order.
#[derive(Default)]
pub struct ScriptedHost
{
    scripts: Mutex<HashMap<String, Script>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedHost
{
    pub fn script(&self, module_name: &str, script: Script)
    {
        self.scripts.lock().unwrap().insert(module_name.to_string(), script);
    }

    pub fn resolve_calls(&self) -> Vec<String>
    {
        self.calls.lock().unwrap().clone()
    }
}

impl ProviderHost for ScriptedHost
{
    fn initialize(&self) -> ProviderResult<()>
    {
        Ok(())
    }

    fn create_provider(&self) -> ProviderResult<Box<dyn SymbolProvider>>
    {
        Ok(Box::new(ScriptedProvider {
            scripts: self.scripts.lock().unwrap().clone(),
            calls: self.calls.clone(),
            loaded: None,
        }))
    }
}

struct ScriptedProvider
{
    scripts: HashMap<String, Script>,
    calls: Arc<Mutex<Vec<String>>>,
    loaded: Option<(String, Script)>,
}

impl ScriptedProvider
{
    fn loaded(&self) -> ProviderResult<&(String, Script)>
    {
        self.loaded.as_ref().ok_or(ProviderError::InvalidHandle)
    }
}

impl SymbolProvider for ScriptedProvider
{
    fn load_symbols(&mut self, _metadata: &dyn ModuleMetadata, image: &ModuleImage) -> ProviderResult<SymbolHandle>
    {
        let name = file_name(&image.path).to_string();
        let script = self
            .scripts
            .get(&name)
            .cloned()
            .ok_or_else(|| ProviderError::NoSymbols(image.path.clone()))?;
        self.loaded = Some((name, script));
        SymbolHandle::from_raw(1).ok_or(ProviderError::InvalidHandle)
    }

    fn resolve_sequence_point(
        &self,
        _handle: SymbolHandle,
        file: &str,
        line: u32,
        _module_base: Address,
    ) -> ProviderResult<(MethodToken, u32)>
    {
        let (name, script) = self.loaded()?;
        self.calls.lock().unwrap().push(name.clone());
        match script {
            Script::Resolves { method, il_offset, .. } => Ok((*method, *il_offset)),
            Script::ResolveFails => Err(ProviderError::NoMapping(format!("{file}:{line}"))),
            Script::LineFails => Ok((MAIN, 0)),
        }
    }

    fn line_by_il_offset(&self, _handle: SymbolHandle, method: MethodToken, il_offset: u32) -> ProviderResult<(u32, String)>
    {
        match &self.loaded()?.1 {
            Script::Resolves { document, .. } => Ok((7, document.clone())),
            Script::ResolveFails | Script::LineFails => Err(ProviderError::NoMapping(format!("{method}+{il_offset}"))),
        }
    }

    fn step_range(&self, _handle: SymbolHandle, il_offset: u32, _method: MethodToken) -> ProviderResult<StepRange>
    {
        Ok(StepRange::new(il_offset, il_offset))
    }

    fn sequence_points(&self, _handle: SymbolHandle, _method: MethodToken) -> ProviderResult<Vec<SequencePoint>>
    {
        Ok(Vec::new())
    }

    fn local_variable(
        &self,
        _handle: SymbolHandle,
        _frame: &dyn TargetFrame,
        method: MethodToken,
        local_index: u32,
    ) -> ProviderResult<LocalScope>
    {
        Err(ProviderError::NoMapping(format!("local {local_index} of {method}")))
    }
}

/// A registry whose providers come from `host`.
pub fn scripted_registry(host: &Arc<ScriptedHost>) -> ModuleRegistry
{
    ModuleRegistry::new(Arc::new(ProviderEnvironment::new(host.clone())))
}
