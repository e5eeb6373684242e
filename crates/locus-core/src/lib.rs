//! # locus-core
//!
//! Module registry and source-location resolution for a managed-runtime
//! debugger backend.
//!
//! This crate provides:
//! - A concurrency-safe registry of the modules loaded in the debuggee, keyed
//!   by base address ([`modules::ModuleRegistry`])
//! - Symbol provider attachment with a process-wide, attempt-once
//!   initialization latch ([`symbols::ProviderEnvironment`])
//! - Source/IL location queries for breakpoints, stack frames, and stepping
//!   ([`resolver::LocationResolver`])
//!
//! ## Collaborators
//!
//! The crate does not parse debug information or control the target process
//! itself. Both sides are traits:
//! - [`symbols::SymbolProvider`] / [`symbols::ProviderHost`]: answers
//!   line/offset questions for one module. [`symbols::table`] ships a
//!   provider over precomputed sequence-point tables.
//! - [`target`]: module, frame, thread, and value handles supplied by the
//!   runtime's debugging interface.

pub mod error;
pub mod modules;
pub mod prelude;
pub mod resolver;
pub mod symbols;
pub mod target;
pub mod types;

pub use error::{LocusError, LocusResult};
pub use modules::{LoadedModule, ModuleInfo, ModuleRegistry, SymbolStatus};
pub use resolver::{FrameLocation, LocationResolver, ResolvedLocation};
