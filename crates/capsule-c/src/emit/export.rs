//! Export fragment emission
//!
//! For each group the fragment carries the alias macro and an initializer
//! list naming the real function for every slot:
//!
//! ```c
//! #define LOOP_API loop_api_<tag>
//!
//! #define LOOP_API_CAPSULE {\
//!   [0] = loop_run,\
//! }
//! ```
//!
//! A build step splices `LOOP_API_CAPSULE` into the provider's table
//! initializer.

use super::{alias_define, BANNER};
use capsule_api::{CapsuleEmitter, CapsuleResult, ModuleCapsule};
use std::fmt::Write;

/// Renders `<module>_export.h`
#[derive(Debug, Clone, Default)]
pub struct ExportEmitter;

impl ExportEmitter {
    pub fn new() -> Self {
        Self
    }

    /// Render the fragment text
    pub fn render(&self, capsule: &ModuleCapsule) -> String {
        let mut out = String::from(BANNER);

        for group in &capsule.groups {
            out.push_str(&alias_define(group));
            let _ = writeln!(out, "#define {}_CAPSULE {{\\", group.alias());
            for (index, function) in group.functions.iter().enumerate() {
                let _ = writeln!(out, "  [{index}] = {},\\", function.name);
            }
            out.push_str("}\n\n");
        }

        out
    }
}

impl CapsuleEmitter for ExportEmitter {
    fn artifact(&self) -> &str {
        "export"
    }

    fn emit(&self, capsule: &ModuleCapsule) -> CapsuleResult<String> {
        Ok(self.render(capsule))
    }
}
