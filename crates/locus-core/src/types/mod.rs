//! # Types
//!
//! Plain data types shared by the registry, the symbol layer, and the resolver.
//!
//! None of these types own target resources; handles to live debuggee objects
//! are modelled by the traits in [`crate::target`].

pub mod address;
pub mod identity;
pub mod location;

// Re-export all public types
pub use address::Address;
pub use identity::ModuleIdentity;
pub use location::{MappingQuality, MethodToken, SequencePoint, StepRange, HIDDEN_LINE};
