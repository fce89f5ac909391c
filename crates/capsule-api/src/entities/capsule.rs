use crate::entities::ApiGroup;
use serde::{Deserialize, Serialize};

/// All API groups exported by one module, in first-seen key order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCapsule {
    /// Module name (last component of the module path)
    pub module_name: String,

    /// Groups in first-seen key order
    pub groups: Vec<ApiGroup>,
}

impl ModuleCapsule {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            groups: Vec::new(),
        }
    }

    /// Append a group
    pub fn add_group(&mut self, group: ApiGroup) {
        self.groups.push(group);
    }

    /// Look up a group by key
    pub fn group(&self, key: &str) -> Option<&ApiGroup> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// A capsule with no groups has no surface and is not generated
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of exported functions across all groups
    pub fn function_count(&self) -> usize {
        self.groups.iter().map(ApiGroup::slot_count).sum()
    }
}
