//! Merges per-file extractions into one module capsule
//!
//! Files are folded in the order they are added; groups keep their
//! first-seen key order and functions are appended, never merged. Version
//! tags are computed once all files are in.

use crate::extractor::FileExtraction;
use capsule_api::{ApiGroup, CapsuleError, CapsuleResult, FunctionSignature, ModuleCapsule};
use log::debug;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Accumulates extraction results for one module
#[derive(Debug, Default)]
pub struct CapsuleAssembler {
    module_name: String,
    groups: Vec<(String, Vec<FunctionSignature>)>,
    files: usize,
}

impl CapsuleAssembler {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            groups: Vec::new(),
            files: 0,
        }
    }

    /// Fold in the next file's functions
    pub fn add_file(&mut self, extraction: FileExtraction) {
        self.files += 1;
        for (key, functions) in extraction.groups {
            match self.groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, existing)) => existing.extend(functions),
                None => self.groups.push((key, functions)),
            }
        }
    }

    /// Number of files folded in so far
    pub fn file_count(&self) -> usize {
        self.files
    }

    /// Validate and seal the capsule, computing every group's version tag.
    ///
    /// Call macros and slot-id macros share the header's file scope, so a
    /// function name may appear only once per module and no two exports may
    /// produce the same macro name.
    pub fn finish(self) -> CapsuleResult<ModuleCapsule> {
        let mut capsule = ModuleCapsule::new(self.module_name);
        let mut names = HashSet::new();
        let mut macros = HashMap::new();

        for (key, functions) in self.groups {
            if let Some(dup) = functions.iter().find(|f| !names.insert(f.name.clone())) {
                return Err(CapsuleError::DuplicateFunction {
                    module: capsule.module_name.clone(),
                    key,
                    name: dup.name.clone(),
                });
            }

            let group = ApiGroup::new(key, functions);
            claim(
                &mut macros,
                &capsule.module_name,
                group.alias(),
                format!("API group {}", group.key),
            )?;
            for function in &group.functions {
                let owner = format!("function {} in {}", function.name, group.key);
                claim(&mut macros, &capsule.module_name, function.name.clone(), owner.clone())?;
                claim(&mut macros, &capsule.module_name, function.slot_macro(), owner)?;
            }

            debug!(
                "{}: group {} has {} slots, tag {}",
                capsule.module_name,
                group.key,
                group.slot_count(),
                group.version_tag
            );
            capsule.add_group(group);
        }

        Ok(capsule)
    }
}

/// Record `name` as defined by `owner`; a second definition is a conflict.
fn claim(
    macros: &mut HashMap<String, String>,
    module: &str,
    name: String,
    owner: String,
) -> CapsuleResult<()> {
    match macros.entry(name) {
        Entry::Occupied(entry) => Err(CapsuleError::MacroConflict {
            module: module.to_string(),
            name: entry.key().clone(),
            first: entry.get().clone(),
            second: owner,
        }),
        Entry::Vacant(entry) => {
            entry.insert(owner);
            Ok(())
        }
    }
}

/// Assemble a capsule from extractions given in file-processing order.
pub fn assemble<I>(module_name: &str, extractions: I) -> CapsuleResult<ModuleCapsule>
where
    I: IntoIterator<Item = FileExtraction>,
{
    let mut assembler = CapsuleAssembler::new(module_name);
    for extraction in extractions {
        assembler.add_file(extraction);
    }
    assembler.finish()
}
