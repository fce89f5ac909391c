//! Configuration for capsule generation
//!
//! Two layers: [`GeneratorConfig`] controls the marker grammar and generated
//! text, [`CapsulesConfig`] is the on-disk `capsules.json` describing which
//! modules to generate and where their artifacts go.

use crate::errors::{CapsuleError, CapsuleResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default header path, relative to the module directory
pub const DEFAULT_OUTPUT: &str = "capsule/{module}.h";

/// Default export fragment path, relative to the module directory
pub const DEFAULT_EXPORT: &str = "{module}_export.h";

/// Configuration for marker scanning and code emission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Export marker macro name
    pub marker: String,

    /// Reserved argument token requesting an implicit context pointer
    pub sentinel: String,

    /// Include guard prefix: `#ifndef <PREFIX>_<MODULE>_API`
    pub guard_prefix: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            marker: "CAPSULE_API".to_string(),
            sentinel: "_ctx_var".to_string(),
            guard_prefix: "CAPSULE".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn with_guard_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.guard_prefix = prefix.into();
        self
    }
}

// Accepts either a single string or a list of strings
mod one_or_many {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<OneOrMany> = Option::deserialize(deserializer)?;
        Ok(value.map(|v| match v {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(list) => list,
        }))
    }
}

// Keeps `modules` in file order
mod ordered_modules {
    use super::ModuleConfig;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, ModuleConfig)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        map.into_iter()
            .map(|(path, value)| {
                let module = serde_json::from_value(value)
                    .map_err(|e| D::Error::custom(format!("module {path}: {e}")))?;
                Ok::<_, D::Error>((path, module))
            })
            .collect()
    }
}

/// Per-module settings from `capsules.json`
///
/// Absent fields fall back to defaults; explicitly empty lists are errors
/// for `output`, `export` and `sources`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleConfig {
    /// Extra include lines, appended after the global ones
    #[serde(deserialize_with = "one_or_many::deserialize")]
    pub include: Option<Vec<String>>,

    /// Header path template
    #[serde(deserialize_with = "one_or_many::deserialize")]
    pub output: Option<Vec<String>>,

    /// Export fragment path template
    #[serde(deserialize_with = "one_or_many::deserialize")]
    pub export: Option<Vec<String>>,

    /// Source files, in processing order
    #[serde(deserialize_with = "one_or_many::deserialize")]
    pub sources: Option<Vec<String>>,

    /// Fragments appended verbatim to the header
    #[serde(deserialize_with = "one_or_many::deserialize")]
    pub extend: Option<Vec<String>>,
}

/// Top-level `capsules.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapsulesConfig {
    /// Include lines applied to every module
    #[serde(deserialize_with = "one_or_many::deserialize")]
    pub include: Option<Vec<String>>,

    /// Override for the include guard prefix
    pub guard_prefix: Option<String>,

    /// Override for the marker macro name
    pub marker: Option<String>,

    /// Override for the context sentinel token
    pub sentinel: Option<String>,

    /// Module path -> settings, in file order
    #[serde(deserialize_with = "ordered_modules::deserialize")]
    pub modules: Vec<(String, ModuleConfig)>,
}

impl CapsulesConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> CapsuleResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CapsuleError::io(path, e))?;
        Self::from_json(&text, path)
    }

    /// Parse configuration text; `path` is used for error reporting only.
    pub fn from_json(text: &str, path: &Path) -> CapsuleResult<Self> {
        serde_json::from_str(text).map_err(|e| CapsuleError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Generator settings with this file's overrides applied
    pub fn generator_config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        if let Some(marker) = &self.marker {
            config = config.with_marker(marker.as_str());
        }
        if let Some(sentinel) = &self.sentinel {
            config = config.with_sentinel(sentinel.as_str());
        }
        if let Some(prefix) = &self.guard_prefix {
            config = config.with_guard_prefix(prefix.as_str());
        }
        config
    }

    /// Settings for a configured module path
    pub fn module(&self, path: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|(p, _)| p == path).map(|(_, m)| m)
    }

    /// Resolve every configured module, in file order.
    pub fn plans(&self, base_dir: &Path) -> CapsuleResult<Vec<ModulePlan>> {
        self.modules
            .iter()
            .map(|(path, module)| self.plan(path, module, base_dir))
            .collect()
    }

    /// Resolve one module's settings against `base_dir`.
    pub fn plan(
        &self,
        path: &str,
        module: &ModuleConfig,
        base_dir: &Path,
    ) -> CapsuleResult<ModulePlan> {
        let name = module_name(path);
        let expand = |list: &[String]| -> Vec<String> {
            list.iter()
                .map(|item| item.replace("{module}", &name).replace("{path}", path))
                .collect()
        };
        let dir = base_dir.join(path);

        let mut include = expand(self.include.as_deref().unwrap_or_default());
        include.extend(expand(module.include.as_deref().unwrap_or_default()));

        let first = |value: &Option<Vec<String>>, default: &str, field: &'static str| {
            let templates = value.clone().unwrap_or_else(|| vec![default.to_string()]);
            expand(templates.as_slice())
                .into_iter()
                .next()
                .map(|p| dir.join(p))
                .ok_or_else(|| CapsuleError::MissingField {
                    module: path.to_string(),
                    field,
                })
        };
        let output = first(&module.output, DEFAULT_OUTPUT, "output")?;
        let export = first(&module.export, DEFAULT_EXPORT, "export")?;

        let sources = match &module.sources {
            Some(list) if list.is_empty() => {
                return Err(CapsuleError::MissingField {
                    module: path.to_string(),
                    field: "sources",
                })
            }
            Some(list) => Some(expand(list)),
            None => None,
        };

        let extend = expand(module.extend.as_deref().unwrap_or_default())
            .into_iter()
            .map(|p| dir.join(p))
            .collect();

        Ok(ModulePlan {
            display: path.to_string(),
            name,
            dir,
            include,
            output,
            export,
            sources,
            extend,
        })
    }
}

/// Fully resolved inputs and outputs for one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePlan {
    /// Module path as configured
    pub display: String,

    /// Module name, used in the include guard
    pub name: String,

    /// Module directory
    pub dir: PathBuf,

    /// Include lines, global first
    pub include: Vec<String>,

    /// Header path
    pub output: PathBuf,

    /// Export fragment path
    pub export: PathBuf,

    /// Source file names relative to `dir`; `None` scans `dir` for `*.c`
    pub sources: Option<Vec<String>>,

    /// Header extension fragments
    pub extend: Vec<PathBuf>,
}

/// Last path component of a module path
fn module_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}
