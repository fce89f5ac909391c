//! Error types for capsule generation.
//!
//! Every failure is terminal for the module being generated; nothing here is retried.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while generating a module capsule
#[derive(Error, Debug)]
pub enum CapsuleError {
    /// Export key does not match the identifier grammar
    #[error("Invalid key '{key}' in {file}: {declaration}")]
    InvalidKey {
        /// Source file containing the marker
        file: PathBuf,
        /// Offending key, as written
        key: String,
        /// Declaration tail following the marker
        declaration: String,
    },

    /// Declaration tail is not shaped like `name(args)`
    #[error("Invalid declaration for key '{key}' in {file}: {declaration}")]
    InvalidDeclaration {
        /// Source file containing the marker
        file: PathBuf,
        /// Export key of the marker
        key: String,
        /// Offending declaration tail
        declaration: String,
    },

    /// Same function exported twice within one module
    #[error("Duplicate function '{name}' in API group '{key}' of module {module}")]
    DuplicateFunction {
        /// Module being assembled
        module: String,
        /// API group key of the second export
        key: String,
        /// Function name seen twice
        name: String,
    },

    /// Two exports would define the same header macro
    #[error("Macro '{name}' defined by both {first} and {second} in module {module}")]
    MacroConflict {
        /// Module being assembled
        module: String,
        /// Macro name
        name: String,
        /// Export that claimed the macro first
        first: String,
        /// Export that collided with it
        second: String,
    },

    /// A required configuration field resolved to nothing
    #[error("`{field}` must be specified for module {module}")]
    MissingField {
        /// Module path as configured
        module: String,
        /// Field name (`output`, `export`, `sources`)
        field: &'static str,
    },

    /// Module directory does not exist
    #[error("Module directory not found: {0}")]
    ModuleNotFound(PathBuf),

    /// Failed to read or write a file
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is malformed
    #[error("Invalid configuration {path}: {message}")]
    Config {
        /// Configuration file path
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// Generated artifact on disk differs from a fresh rendering
    #[error("Generated file is out of date: {path}")]
    Drift {
        /// Stale artifact
        path: PathBuf,
    },
}

impl CapsuleError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for capsule operations
pub type CapsuleResult<T> = Result<T, CapsuleError>;
