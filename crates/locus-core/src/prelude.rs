//! Common module for library exports

pub use crate::error::{LocusError, LocusResult};
pub use crate::modules::{LoadedModule, ModuleInfo, ModuleRegistry, NamedLocal, SymbolStatus};
pub use crate::resolver::{nearest_sequence_point, FrameLocation, LocationResolver, ResolvedLocation};
pub use crate::symbols::{ProviderEnvironment, ProviderError, ProviderHost, SymbolLoadPolicy, SymbolProvider};
pub use crate::target::{ModuleMetadata, TargetFrame, TargetModule, TargetThread, TargetValue};
pub use crate::types::{Address, MappingQuality, MethodToken, ModuleIdentity, SequencePoint, StepRange};
