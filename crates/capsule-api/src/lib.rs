//! Capsule API
//!
//! Shared model and types for the capsule API generator.
//!
//! A *capsule* is the pair of generated C artifacts that lets one native
//! module call functions of another without linking against it: a consumer
//! header declaring a versioned call table with call-site macros, and an
//! export fragment listing the functions that fill that table.
//!
//! This crate defines:
//!
//! - **Entities**: [`FunctionSignature`], [`ApiGroup`] and [`ModuleCapsule`]
//! - **Version tags**: content digests that rename a table whenever its shape changes
//! - **Configuration**: generator settings and the `capsules.json` model
//! - **CapsuleEmitter trait**: the interface both artifact writers implement
//! - **Metrics** and **error handling**
//!
//! # Example
//!
//! ```rust
//! use capsule_api::{ApiGroup, FunctionSignature};
//!
//! let group = ApiGroup::new(
//!     "loop_api",
//!     vec![FunctionSignature::new("loop_run", "int").with_args(["int mode"])],
//! );
//! assert_eq!(group.alias(), "LOOP_API");
//! assert_eq!(group.version_tag.len(), 32);
//! ```

pub mod config;
pub mod entities;
pub mod errors;
pub mod metrics;
pub mod traits;


// Re-export commonly used types
pub use config::{CapsulesConfig, GeneratorConfig, ModuleConfig, ModulePlan};
pub use entities::{version_tag, ApiGroup, FunctionSignature, ModuleCapsule};
pub use errors::{CapsuleError, CapsuleResult};
pub use metrics::GenerationMetrics;
pub use traits::CapsuleEmitter;
