//! # Target-Control Contracts
//!
//! The narrow set of capabilities the registry and resolver need from the
//! layer that actually drives the debuggee.
//!
//! That layer owns attaching, memory access, and thread/frame enumeration.
//! Here we only describe what we consume from it, so the registry can be
//! driven by a real runtime debugging interface or by test doubles alike.
//!
//! ## Handle lifetime
//!
//! Module handles are shared as `Arc<dyn TargetModule>`. The registry keeps
//! one clone per tracked module and drops it when the module is unregistered
//! or the registry is cleared; implementations release the underlying native
//! reference in their `Drop`. Frames and threads are only borrowed for the
//! duration of a single call.

use std::fmt;
use std::sync::Arc;

use crate::error::LocusResult;
use crate::types::{Address, MappingQuality, MethodToken, ModuleIdentity};

/// Metadata scope of a loaded module.
pub trait ModuleMetadata: Send + Sync
{
    /// Read the module version id stored in the metadata scope.
    fn module_version_id(&self) -> LocusResult<ModuleIdentity>;
}

/// A module loaded in the debuggee.
pub trait TargetModule: Send + Sync
{
    /// Virtual address the image is mapped at.
    fn base_address(&self) -> LocusResult<Address>;

    /// Size of the mapped image in bytes.
    fn size(&self) -> LocusResult<u32>;

    /// Module path as reported by the runtime.
    ///
    /// This may be relative to the debuggee (e.g. `/proc/self/fd/8/app.dll`);
    /// see [`crate::modules::path::module_path`] for the rewrite we apply.
    fn name(&self) -> LocusResult<String>;

    /// PID of the process that loaded the module.
    fn process_id(&self) -> LocusResult<u32>;

    /// Obtain the module's metadata scope.
    ///
    /// ## Errors
    ///
    /// Implementations should return `MetadataUnavailable` when the runtime
    /// cannot produce a metadata scope for this module.
    fn metadata(&self) -> LocusResult<Arc<dyn ModuleMetadata>>;

    /// Whether the module was emitted at run time (reflection emit).
    fn is_dynamic(&self) -> LocusResult<bool>;

    /// Whether the module was loaded from a byte array rather than a file.
    fn is_in_memory(&self) -> LocusResult<bool>;

    /// Tell the runtime whether this module counts as user code for
    /// Just-My-Code stepping.
    ///
    /// The default implementation does nothing, for targets without JMC.
    fn set_just_my_code(&self, _is_user_code: bool) -> LocusResult<()>
    {
        Ok(())
    }
}

/// Opaque handle to a value in the debuggee.
pub trait TargetValue: Send + Sync + fmt::Debug
{
    /// Address of the value's storage, if it lives in memory.
    fn address(&self) -> LocusResult<Option<Address>>;

    /// Size of the value in bytes.
    fn size(&self) -> LocusResult<u64>;
}

/// An IL stack frame.
pub trait TargetFrame
{
    /// Token of the method executing in this frame.
    fn method_token(&self) -> LocusResult<MethodToken>;

    /// Module that defines the executing method.
    fn module(&self) -> LocusResult<Arc<dyn TargetModule>>;

    /// Current IL offset and how exactly the native IP mapped onto it.
    fn il_offset(&self) -> LocusResult<(u32, MappingQuality)>;

    /// Size of the executing method's IL body in bytes.
    fn il_code_size(&self) -> LocusResult<u32>;

    /// Value of the local variable slot `index`, if the runtime has one.
    fn local_variable(&self, index: u32) -> LocusResult<Option<Arc<dyn TargetValue>>>;
}

/// A thread in the debuggee.
pub trait TargetThread
{
    /// Innermost frame, or `None` when the thread is not executing managed code.
    fn active_frame(&self) -> LocusResult<Option<Box<dyn TargetFrame>>>;
}
