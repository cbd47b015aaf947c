//! Source-side error vocabulary.

use std::path::PathBuf;

/// Errors raised while reading sources or resolving names.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{file}:{line}:{column}: {message}")]
    Syntax {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("cyclic import of `{0}`")]
    CyclicImport(String),

    #[error("`{name}` is already declared in module `{module}`")]
    DuplicateSymbol { module: String, name: String },

    #[error("unresolved reference `{reference}` in module `{module}`")]
    Unresolved { module: String, reference: String },

    #[error("unknown module `{0}`")]
    UnknownModule(String),

    #[error("invalid {kind} label `{label}`")]
    InvalidLabel { kind: String, label: String },

    #[error("{file}: `{kind}` block: {message}")]
    InvalidBlock {
        file: PathBuf,
        kind: String,
        message: String,
    },

    #[error("{path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl SourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        SourceError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
