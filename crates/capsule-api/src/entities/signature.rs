use serde::{Deserialize, Serialize};

/// One exported C function, as declared at its marker site
///
/// Return and argument types are opaque text, reproduced verbatim in
/// generated code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,

    /// Return type, trimmed
    pub return_type: String,

    /// Public argument declarations, trimmed, with the context sentinel removed
    pub args: Vec<String>,

    /// Whether an opaque context pointer is prepended at call sites
    pub has_implicit_context: bool,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            args: Vec::new(),
            has_implicit_context: false,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_implicit_context(mut self) -> Self {
        self.has_implicit_context = true;
        self
    }

    /// True when callers pass at least one argument of their own
    pub fn has_args(&self) -> bool {
        !self.args.is_empty()
    }

    /// Name of the numeric slot-id macro, e.g. `LOOP_RUN_ID`
    pub fn slot_macro(&self) -> String {
        format!("{}_ID", self.name.to_uppercase())
    }
}
