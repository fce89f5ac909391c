//! Consumer header emission
//!
//! Layout of `<module>.h`:
//!
//! 1. banner
//! 2. include guard `#ifndef <PREFIX>_<MODULE>_API`
//! 3. configured `#include` lines
//! 4. per group: table storage, alias macro, and per function a slot-id
//!    macro plus a call-through macro
//! 5. extension fragments, verbatim
//! 6. `#endif`
//!
//! A call macro casts its table slot to the exact function pointer type and
//! calls through it, so `loop_run(loop, 0)` at a call site becomes
//!
//! ```c
//! ((int (*) (uv_loop_t *loop, int mode))(loop_api_<tag>__api[LOOP_RUN_ID]))(loop, 0)
//! ```
//!
//! The tables are only declared here; filling them is up to the runtime.

use super::{alias_define, BANNER};
use capsule_api::{ApiGroup, CapsuleEmitter, CapsuleResult, FunctionSignature, ModuleCapsule};
use std::fmt::Write;

/// Parameter type standing in for the implicit context
const CONTEXT_TYPE: &str = "void*";

/// Renders `<module>.h`
#[derive(Debug, Clone)]
pub struct HeaderEmitter {
    guard_prefix: String,
    include: Vec<String>,
    extensions: Vec<String>,
}

impl Default for HeaderEmitter {
    fn default() -> Self {
        Self::new("CAPSULE")
    }
}

impl HeaderEmitter {
    pub fn new(guard_prefix: impl Into<String>) -> Self {
        Self {
            guard_prefix: guard_prefix.into(),
            include: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Headers to `#include` after the guard
    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    /// Fragment texts appended after all groups
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Render the header text
    pub fn render(&self, capsule: &ModuleCapsule) -> String {
        let mut out = String::from(BANNER);

        let guard = format!(
            "{}_{}_API",
            self.guard_prefix,
            guard_name(&capsule.module_name)
        );
        let _ = writeln!(out, "#ifndef {guard}");
        let _ = writeln!(out, "#define {guard}\n");

        if !self.include.is_empty() {
            for item in &self.include {
                let _ = writeln!(out, "#include {}", include_target(item));
            }
            out.push('\n');
        }

        for group in &capsule.groups {
            self.render_group(&mut out, group);
        }

        for fragment in &self.extensions {
            out.push_str(fragment);
            out.push('\n');
        }

        out.push_str("#endif\n");
        out
    }

    fn render_group(&self, out: &mut String, group: &ApiGroup) {
        let table = group.versioned_name();

        let _ = writeln!(out, "static int {table}__api_loaded = 0;");
        let _ = writeln!(out, "static void *{table}__api[{}];\n", group.slot_count());
        out.push_str(&alias_define(group));

        for (index, function) in group.functions.iter().enumerate() {
            let slot = function.slot_macro();
            let _ = writeln!(out, "#define {slot} {index}");

            if function.has_args() || function.has_implicit_context {
                let _ = writeln!(out, "#define {}(...) \\", function.name);
            } else {
                let _ = writeln!(out, "#define {}() \\", function.name);
            }
            let _ = writeln!(
                out,
                "  (({} (*) ({}))({table}__api[{slot}]))( \\",
                function.return_type,
                parameter_list(function)
            );
            let _ = writeln!(out, "    {})\n", argument_list(function, &table));
        }
    }
}

impl CapsuleEmitter for HeaderEmitter {
    fn artifact(&self) -> &str {
        "header"
    }

    fn emit(&self, capsule: &ModuleCapsule) -> CapsuleResult<String> {
        Ok(self.render(capsule))
    }
}

/// Parameter types of the function pointer cast
fn parameter_list(function: &FunctionSignature) -> String {
    let mut params: Vec<&str> = Vec::with_capacity(function.args.len() + 1);
    if function.has_implicit_context {
        params.push(CONTEXT_TYPE);
    }
    params.extend(function.args.iter().map(String::as_str));

    if params.is_empty() {
        "void".to_string()
    } else {
        params.join(", ")
    }
}

/// Arguments passed through the cast pointer
fn argument_list(function: &FunctionSignature, table: &str) -> String {
    let mut args = Vec::with_capacity(2);
    if function.has_implicit_context {
        args.push(format!("_ctx->{table}__ctx"));
    }
    if function.has_args() {
        args.push("__VA_ARGS__".to_string());
    }
    args.join(", ")
}

/// Upper-cased module name with non-identifier characters replaced by `_`
fn guard_name(module_name: &str) -> String {
    module_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Bare names are quoted; `"..."` and `<...>` pass through.
fn include_target(item: &str) -> String {
    let item = item.trim();
    if item.starts_with('"') || item.starts_with('<') {
        item.to_string()
    } else {
        format!("\"{item}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capsule() -> ModuleCapsule {
        let mut capsule = ModuleCapsule::new("loop");
        capsule.add_group(ApiGroup::new(
            "loop_api",
            vec![
                FunctionSignature::new("loop_run", "int").with_args(["uv_loop_t *loop", "int mode"]),
                FunctionSignature::new("loop_now", "double"),
                FunctionSignature::new("loop_alive", "int").with_implicit_context(),
                FunctionSignature::new("loop_stop", "void")
                    .with_args(["int force"])
                    .with_implicit_context(),
            ],
        ));
        capsule
    }

    #[test]
    fn test_guard_and_banner() {
        let text = HeaderEmitter::default().render(&capsule());
        assert!(text.starts_with("// Auto-generated\n\n#ifndef CAPSULE_LOOP_API\n#define CAPSULE_LOOP_API\n\n"));
        assert!(text.ends_with("#endif\n"));
    }

    #[test]
    fn test_guard_replaces_invalid_characters() {
        let mut capsule = capsule();
        capsule.module_name = "my-mod.v2".to_string();
        let text = HeaderEmitter::default().render(&capsule);
        assert!(text.contains("#ifndef CAPSULE_MY_MOD_V2_API\n#define CAPSULE_MY_MOD_V2_API\n"));
    }

    #[test]
    fn test_table_and_alias() {
        let capsule = capsule();
        let v = capsule.groups[0].versioned_name();
        let text = HeaderEmitter::default().render(&capsule);

        assert!(text.contains(&format!("static int {v}__api_loaded = 0;\n")));
        assert!(text.contains(&format!("static void *{v}__api[4];\n\n")));
        assert!(text.contains(&format!("#define LOOP_API {v}\n")));
    }

    #[test]
    fn test_call_macro_with_args() {
        let capsule = capsule();
        let v = capsule.groups[0].versioned_name();
        let text = HeaderEmitter::default().render(&capsule);

        let expected = format!(
            "#define LOOP_RUN_ID 0\n\
             #define loop_run(...) \\\n\
             \x20 ((int (*) (uv_loop_t *loop, int mode))({v}__api[LOOP_RUN_ID]))( \\\n\
             \x20   __VA_ARGS__)\n\n"
        );
        assert!(text.contains(&expected), "missing:\n{expected}\nin:\n{text}");
    }

    #[test]
    fn test_call_macro_without_args() {
        let capsule = capsule();
        let v = capsule.groups[0].versioned_name();
        let text = HeaderEmitter::default().render(&capsule);

        let expected = format!(
            "#define LOOP_NOW_ID 1\n\
             #define loop_now() \\\n\
             \x20 ((double (*) (void))({v}__api[LOOP_NOW_ID]))( \\\n\
             \x20   )\n\n"
        );
        assert!(text.contains(&expected), "missing:\n{expected}\nin:\n{text}");
    }

    #[test]
    fn test_context_only_is_variadic() {
        let capsule = capsule();
        let v = capsule.groups[0].versioned_name();
        let text = HeaderEmitter::default().render(&capsule);

        let expected = format!(
            "#define LOOP_ALIVE_ID 2\n\
             #define loop_alive(...) \\\n\
             \x20 ((int (*) (void*))({v}__api[LOOP_ALIVE_ID]))( \\\n\
             \x20   _ctx->{v}__ctx)\n\n"
        );
        assert!(text.contains(&expected), "missing:\n{expected}\nin:\n{text}");
    }

    #[test]
    fn test_context_with_args() {
        let capsule = capsule();
        let v = capsule.groups[0].versioned_name();
        let text = HeaderEmitter::default().render(&capsule);

        assert!(text.contains(&format!(
            "((void (*) (void*, int force))({v}__api[LOOP_STOP_ID]))( \\\n    _ctx->{v}__ctx, __VA_ARGS__)\n"
        )));
        assert!(!text.contains("_ctx_var"));
    }

    #[test]
    fn test_includes_and_extensions() {
        let emitter = HeaderEmitter::new("PROMISEDIO")
            .with_include(vec![
                "common.h".to_string(),
                "<Python.h>".to_string(),
                "\"quoted.h\"".to_string(),
            ])
            .with_extensions(vec!["#define LOOP_EXTRA 1".to_string()]);
        let text = emitter.render(&capsule());

        assert!(text.contains(
            "#define PROMISEDIO_LOOP_API\n\n#include \"common.h\"\n#include <Python.h>\n#include \"quoted.h\"\n\n"
        ));
        assert!(text.ends_with("#define LOOP_EXTRA 1\n#endif\n"));
    }
}
