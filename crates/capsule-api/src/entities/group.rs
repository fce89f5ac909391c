use crate::entities::FunctionSignature;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Number of digest bytes kept in a version tag
const TAG_BYTES: usize = 16;

/// A named set of exported functions emitted as one versioned call table
///
/// The slot index of a function is its position in `functions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiGroup {
    /// Lower-cased export key
    pub key: String,

    /// Functions in slot order
    pub functions: Vec<FunctionSignature>,

    /// Content digest of `functions`
    pub version_tag: String,
}

impl ApiGroup {
    /// Build a group and compute its version tag from the function list.
    pub fn new(key: impl Into<String>, functions: Vec<FunctionSignature>) -> Self {
        let version_tag = version_tag(&functions);
        Self {
            key: key.into(),
            functions,
            version_tag,
        }
    }

    /// Table symbol name: `<key>_<tag>`
    pub fn versioned_name(&self) -> String {
        format!("{}_{}", self.key, self.version_tag)
    }

    /// Stable alias macro name: the upper-cased key
    pub fn alias(&self) -> String {
        self.key.to_uppercase()
    }

    /// Number of table slots
    pub fn slot_count(&self) -> usize {
        self.functions.len()
    }
}

/// Digest of the ordered literal structure of a function list.
///
/// Any change to a name, return type, argument, the context flag, the
/// order or the count yields a different tag.
pub fn version_tag(functions: &[FunctionSignature]) -> String {
    // Serializing plain strings, vectors and bools cannot fail
    let canonical = serde_json::to_vec(functions).expect("Failed to serialize signatures");
    let digest = Sha256::digest(&canonical);

    let mut out = String::with_capacity(TAG_BYTES * 2);
    for b in &digest[..TAG_BYTES] {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}
