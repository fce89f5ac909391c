//! Code emission for the two capsule artifacts
//!
//! Both emitters walk the same ordered [`ModuleCapsule`](capsule_api::ModuleCapsule),
//! so the slot index of a function is identical in the header and the
//! export fragment.

pub mod export;
pub mod header;

pub use export::ExportEmitter;
pub use header::HeaderEmitter;

/// First lines of every generated file
pub const BANNER: &str = "// Auto-generated\n\n";

/// `#define KEY key_<tag>`, shared verbatim by both artifacts
fn alias_define(group: &capsule_api::ApiGroup) -> String {
    format!("#define {} {}\n\n", group.alias(), group.versioned_name())
}
