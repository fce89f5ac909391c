//! # capsule-c
//!
//! Capsule generator for C - lets independently compiled native modules call
//! each other's functions through a private, versioned call table instead of
//! linking.
//!
//! ## Features
//!
//! - Scan C sources for `CAPSULE_API(key, ret) name(args)` export markers
//! - Merge exports per key across a module's files, in file order
//! - Content-derived version tags baked into table symbol names, so a
//!   consumer built against a different signature set fails to link
//! - Consumer header with call-through macros that read like direct calls
//! - Export fragment with the table initializer for the providing module
//! - Atomic writes and a check mode for stale-header detection in CI
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use capsule_c::CapsuleGenerator;
//! use capsule_api::CapsulesConfig;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CapsulesConfig::load(Path::new("capsules.json"))?;
//! let generator = CapsuleGenerator::new(config.generator_config());
//!
//! for plan in config.plans(Path::new("."))? {
//!     let report = generator.generate(&plan)?;
//!     println!("{}: {} functions", report.module, report.functions);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Rendering without touching disk
//!
//! ```rust
//! use capsule_api::{ApiGroup, FunctionSignature, ModuleCapsule};
//! use capsule_c::{ExportEmitter, HeaderEmitter};
//!
//! let mut capsule = ModuleCapsule::new("loop");
//! capsule.add_group(ApiGroup::new(
//!     "loop_api",
//!     vec![FunctionSignature::new("loop_run", "int").with_args(["int mode"])],
//! ));
//!
//! let header = HeaderEmitter::default().render(&capsule);
//! let export = ExportEmitter::new().render(&capsule);
//! assert!(header.contains("#define loop_run(...)"));
//! assert!(export.contains("[0] = loop_run,"));
//! ```

pub mod assembler;
pub mod emit;
pub mod extractor;
pub mod generator;
pub mod writer;

// Re-export api types for convenience
pub use capsule_api::{
    ApiGroup, CapsuleEmitter, CapsuleError, CapsuleResult, CapsulesConfig, FunctionSignature,
    GenerationMetrics, GeneratorConfig, ModuleCapsule, ModulePlan,
};

// Export key types from submodules
pub use assembler::{assemble, CapsuleAssembler};
pub use emit::{ExportEmitter, HeaderEmitter};
pub use extractor::{extract, FileExtraction};
pub use generator::{
    CapsuleGenerator, ModuleOutcome, ModuleReport, RenderOutcome, RenderedCapsule, RunSummary,
    WriteMode,
};
