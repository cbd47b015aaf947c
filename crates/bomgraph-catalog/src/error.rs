//! Catalog error vocabulary.

use bomgraph_core::SymbolError;

/// Errors raised while opening, reading, or writing a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Qualifier or digest absent from the catalog. Callers may recover.
    #[error("not found: {0}")]
    NotFound(String),

    /// The blob exists but the type index has no entry for it.
    #[error("no type index entry for {0}")]
    MissingType(String),

    #[error("{path}:{line}: malformed index entry: {message}")]
    MalformedIndex {
        path: String,
        line: usize,
        message: String,
    },

    /// Multiple outputs or co-items where exactly one is required.
    #[error("not implemented: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("config error: {0}")]
    Config(String),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }
}
