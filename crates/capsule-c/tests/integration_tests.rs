//! Integration tests for the capsule generator

use capsule_c::{
    CapsuleError, CapsuleGenerator, CapsulesConfig, GeneratorConfig, ModuleOutcome, ModulePlan,
    RenderOutcome, RenderedCapsule, WriteMode,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const LOOP_C: &str = r#"
#include "loop.h"

CAPSULE_API(loop_api, int)
loop_run(_ctx_var, int mode);

CAPSULE_API(loop_api, double)
loop_now(void);

CAPSULE_API(handle_api, void)
handle_close(PyObject *handle, void (*cb)(PyObject *, int))
{
    cb(handle, 0);
}
"#;

const TIMER_C: &str = r#"
CAPSULE_API(loop_api, PyObject *)
loop_call_later(double delay, PyObject *callback);
"#;

fn module_dir(root: &Path, name: &str, files: &[(&str, &str)]) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for (file, text) in files {
        fs::write(dir.join(file), text).unwrap();
    }
}

fn default_plan(root: &Path, name: &str) -> ModulePlan {
    CapsulesConfig::default()
        .plan(name, &Default::default(), root)
        .unwrap()
}

fn rendered(generator: &CapsuleGenerator, plan: &ModulePlan) -> RenderedCapsule {
    match generator.render(plan).unwrap() {
        RenderOutcome::Rendered(rendered) => rendered,
        other => panic!("Expected rendered capsule, got {other:?}"),
    }
}

/// (name, slot) pairs from `#define NAME_ID n` lines
fn header_slots(header: &str) -> Vec<(String, usize)> {
    header
        .lines()
        .filter_map(|l| l.strip_prefix("#define "))
        .filter_map(|l| {
            let (name, index) = l.split_once(' ')?;
            let name = name.strip_suffix("_ID")?;
            Some((name.to_lowercase(), index.parse().ok()?))
        })
        .collect()
}

/// (name, slot) pairs from `  [n] = name,\` lines
fn export_slots(export: &str) -> Vec<(String, usize)> {
    export
        .lines()
        .filter_map(|l| l.trim().strip_prefix('['))
        .filter_map(|l| {
            let (index, rest) = l.split_once("] = ")?;
            let name = rest.strip_suffix(",\\")?;
            Some((name.to_string(), index.parse().ok()?))
        })
        .collect()
}

#[test]
fn test_generate_module_with_default_sources() {
    let root = TempDir::new().unwrap();
    // timer.c sorts after loop.c
    module_dir(root.path(), "loop", &[("timer.c", TIMER_C), ("loop.c", LOOP_C)]);

    let plan = default_plan(root.path(), "loop");
    let report = CapsuleGenerator::default().generate(&plan).unwrap();

    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.groups, 2);
    assert_eq!(report.functions, 4);
    assert!(matches!(report.outcome, ModuleOutcome::Generated { .. }));

    let header = fs::read_to_string(root.path().join("loop/capsule/loop.h")).unwrap();
    let export = fs::read_to_string(root.path().join("loop/loop_export.h")).unwrap();

    assert!(header.contains("#ifndef CAPSULE_LOOP_API"));
    assert!(header.contains("#define loop_run(...) \\"));
    assert!(header.contains("#define loop_now() \\"));
    assert!(header.contains("#define LOOP_CALL_LATER_ID 2"));
    assert!(!header.contains("_ctx_var"));
    assert!(export.contains("#define HANDLE_API_CAPSULE {\\\n  [0] = handle_close,\\\n}\n"));
}

#[test]
fn test_slots_agree_between_artifacts() {
    let root = TempDir::new().unwrap();
    module_dir(root.path(), "loop", &[("loop.c", LOOP_C), ("timer.c", TIMER_C)]);

    let plan = default_plan(root.path(), "loop");
    let rendered = rendered(&CapsuleGenerator::default(), &plan);

    let mut from_header = header_slots(&rendered.header);
    let mut from_export = export_slots(&rendered.export);
    from_header.sort();
    from_export.sort();
    assert_eq!(from_header.len(), 4);
    assert_eq!(from_header, from_export);

    for group in &rendered.capsule.groups {
        let v = group.versioned_name();
        assert!(rendered.header.contains(&format!("#define {} {v}\n", group.alias())));
        assert!(rendered.export.contains(&format!("#define {} {v}\n", group.alias())));
    }
}

#[test]
fn test_generation_is_deterministic() {
    let root = TempDir::new().unwrap();
    module_dir(root.path(), "loop", &[("loop.c", LOOP_C), ("timer.c", TIMER_C)]);
    let plan = default_plan(root.path(), "loop");
    let generator = CapsuleGenerator::default();

    generator.generate(&plan).unwrap();
    let first = fs::read(&plan.output).unwrap();
    let first_export = fs::read(&plan.export).unwrap();

    generator.generate(&plan).unwrap();
    assert_eq!(first, fs::read(&plan.output).unwrap());
    assert_eq!(first_export, fs::read(&plan.export).unwrap());
}

#[test]
fn test_signature_drift_renames_only_changed_group() {
    let root = TempDir::new().unwrap();
    module_dir(root.path(), "loop", &[("loop.c", LOOP_C)]);
    let plan = default_plan(root.path(), "loop");
    let generator = CapsuleGenerator::default();

    let before = rendered(&generator, &plan).capsule;

    let edited = LOOP_C.replace("int mode", "long mode");
    fs::write(root.path().join("loop/loop.c"), edited).unwrap();
    let after = rendered(&generator, &plan).capsule;

    assert_ne!(
        before.group("loop_api").unwrap().version_tag,
        after.group("loop_api").unwrap().version_tag
    );
    assert_eq!(
        before.group("handle_api").unwrap().version_tag,
        after.group("handle_api").unwrap().version_tag
    );
}

#[test]
fn test_module_without_markers_is_skipped() {
    let root = TempDir::new().unwrap();
    module_dir(root.path(), "plain", &[("plain.c", "int main(void) { return 0; }\n")]);

    let plan = default_plan(root.path(), "plain");
    assert!(matches!(
        CapsuleGenerator::default().render(&plan).unwrap(),
        RenderOutcome::Empty { files_scanned: 1 }
    ));
    let report = CapsuleGenerator::default().generate(&plan).unwrap();

    assert_eq!(report.outcome, ModuleOutcome::Skipped);
    assert_eq!(report.files_scanned, 1);
    assert!(!plan.output.exists());
    assert!(!plan.export.exists());
}

#[test]
fn test_missing_module_directory() {
    let root = TempDir::new().unwrap();
    let plan = default_plan(root.path(), "nowhere");

    let result = CapsuleGenerator::default().generate(&plan);
    assert!(matches!(result, Err(CapsuleError::ModuleNotFound(_))));
}

#[test]
fn test_invalid_marker_writes_nothing() {
    let root = TempDir::new().unwrap();
    let broken = format!("{LOOP_C}\nCAPSULE_API(bad-key, int) broken(int a);\n");
    module_dir(root.path(), "loop", &[("loop.c", broken.as_str())]);

    let plan = default_plan(root.path(), "loop");
    match CapsuleGenerator::default().generate(&plan) {
        Err(CapsuleError::InvalidKey { key, file, .. }) => {
            assert_eq!(key, "bad-key");
            assert!(file.ends_with("loop.c"));
        }
        other => panic!("Expected InvalidKey, got {other:?}"),
    }
    assert!(!plan.output.exists());
    assert!(!plan.export.exists());
}

#[test]
fn test_check_mode_detects_drift() {
    let root = TempDir::new().unwrap();
    module_dir(root.path(), "loop", &[("loop.c", LOOP_C)]);
    let plan = default_plan(root.path(), "loop");

    let checker = CapsuleGenerator::default().with_mode(WriteMode::Check);
    assert!(matches!(
        checker.generate(&plan),
        Err(CapsuleError::Drift { .. })
    ));
    assert!(!plan.output.exists());

    CapsuleGenerator::default().generate(&plan).unwrap();
    assert!(checker.generate(&plan).is_ok());

    fs::write(root.path().join("loop/timer.c"), TIMER_C).unwrap();
    assert!(matches!(
        checker.generate(&plan),
        Err(CapsuleError::Drift { .. })
    ));
}

#[test]
fn test_config_driven_generation() {
    let root = TempDir::new().unwrap();
    module_dir(
        root.path(),
        "src/loop",
        &[
            ("loop.c", LOOP_C),
            ("timer.c", TIMER_C),
            ("ignored.c", "CAPSULE_API(other_api, int) ignored(int a);\n"),
            ("extra.h", "#define LOOP_EXTRA 1"),
        ],
    );

    let config = CapsulesConfig::from_json(
        r#"{
            "include": "common.h",
            "guard_prefix": "PROMISEDIO",
            "modules": {
                "src/loop": {
                    "include": "<uv.h>",
                    "sources": ["timer.c", "loop.c"],
                    "output": "include/{module}.h",
                    "export": "export.h",
                    "extend": "extra.h"
                }
            }
        }"#,
        Path::new("capsules.json"),
    )
    .unwrap();

    let plans = config.plans(root.path()).unwrap();
    let generator = CapsuleGenerator::new(config.generator_config());
    let report = generator.generate(&plans[0]).unwrap();
    assert_eq!(report.functions, 4);

    let header = fs::read_to_string(root.path().join("src/loop/include/loop.h")).unwrap();
    assert!(header.contains("#ifndef PROMISEDIO_LOOP_API"));
    assert!(header.contains("#include \"common.h\"\n#include <uv.h>\n"));
    assert!(header.ends_with("#define LOOP_EXTRA 1\n#endif\n"));
    assert!(!header.contains("ignored"));
    // timer.c comes first, so loop_call_later takes slot 0
    assert!(header.contains("#define LOOP_CALL_LATER_ID 0"));

    let export = fs::read_to_string(root.path().join("src/loop/export.h")).unwrap();
    assert!(export.contains("  [0] = loop_call_later,\\"));
}

#[test]
fn test_duplicate_function_across_files() {
    let root = TempDir::new().unwrap();
    module_dir(root.path(), "loop", &[("a.c", TIMER_C), ("b.c", TIMER_C)]);

    let plan = default_plan(root.path(), "loop");
    let result = CapsuleGenerator::default().generate(&plan);
    assert!(matches!(result, Err(CapsuleError::DuplicateFunction { .. })));
}

#[test]
fn test_generate_all_keep_going() {
    let root = TempDir::new().unwrap();
    module_dir(root.path(), "loop", &[("loop.c", LOOP_C)]);
    module_dir(root.path(), "plain", &[("plain.c", "int x;\n")]);

    let plans = vec![
        default_plan(root.path(), "missing"),
        default_plan(root.path(), "loop"),
        default_plan(root.path(), "plain"),
    ];
    let generator = CapsuleGenerator::default();

    let stopped = generator.generate_all(&plans, false, false);
    assert_eq!(stopped.metrics.modules_attempted, 1);
    assert_eq!(stopped.failures.len(), 1);

    let all = generator.generate_all(&plans, false, true);
    assert_eq!(all.metrics.modules_attempted, 3);
    assert_eq!(all.metrics.modules_generated, 1);
    assert_eq!(all.metrics.modules_skipped, 1);
    assert_eq!(all.metrics.modules_failed, 1);
    assert_eq!(all.failures[0].0, "missing");

    let parallel = generator.generate_all(&plans, true, false);
    assert_eq!(parallel.metrics.modules_attempted, 3);
    assert_eq!(parallel.reports.len(), 2);
    assert!(!parallel.is_success());
}

#[test]
fn test_custom_marker_and_sentinel() {
    let root = TempDir::new().unwrap();
    module_dir(
        root.path(),
        "fs",
        &[("fs.c", "EXPORT_API(fs_api, int) fs_open(__state, const char *path);\n")],
    );

    let config = GeneratorConfig::default()
        .with_marker("EXPORT_API")
        .with_sentinel("__state");
    let plan = default_plan(root.path(), "fs");
    let rendered = rendered(&CapsuleGenerator::new(config), &plan);

    assert!(rendered.header.contains("(int (*) (void*, const char *path))"));
    assert!(!rendered.header.contains("__state"));
}

#[test]
fn test_same_function_in_two_groups_rejected() {
    let root = TempDir::new().unwrap();
    module_dir(
        root.path(),
        "loop",
        &[(
            "loop.c",
            "CAPSULE_API(loop_api, int) same(int x);\nCAPSULE_API(handle_api, int) same(int x);\n",
        )],
    );

    let plan = default_plan(root.path(), "loop");
    match CapsuleGenerator::default().generate(&plan) {
        Err(CapsuleError::DuplicateFunction { key, name, .. }) => {
            assert_eq!(key, "handle_api");
            assert_eq!(name, "same");
        }
        other => panic!("Expected DuplicateFunction, got {other:?}"),
    }
    assert!(!plan.output.exists());
}

#[test]
fn test_module_name_sanitized_in_guard() {
    let root = TempDir::new().unwrap();
    module_dir(root.path(), "my-mod", &[("my.c", TIMER_C)]);

    let plan = default_plan(root.path(), "my-mod");
    let rendered = rendered(&CapsuleGenerator::default(), &plan);
    assert!(rendered.header.contains("#ifndef CAPSULE_MY_MOD_API\n#define CAPSULE_MY_MOD_API\n"));
}
