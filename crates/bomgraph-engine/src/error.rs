//! Engine error vocabulary.

use bomgraph_catalog::CatalogError;
use bomgraph_core::SymbolError;
use bomgraph_source::SourceError;

/// Errors raised while compiling, building, or matching.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("not found: {0}")]
    NotFound(String),

    /// Cardinality the model does not handle yet.
    #[error("not implemented: {0}")]
    Unsupported(String),

    #[error("cyclic reference while compiling `{0}`")]
    CyclicReference(String),

    #[error("cyclic production: `{0}` is required to build itself")]
    CyclicProduction(String),

    #[error("`{qualifier}`: {message}")]
    InvalidBlock { qualifier: String, message: String },

    #[error("graph artifact {path}: {message}")]
    Artifact { path: String, message: String },
}

impl EngineError {
    /// Whether the error means "absent" rather than "broken".
    pub fn is_not_found(&self) -> bool {
        match self {
            EngineError::NotFound(_) => true,
            EngineError::Catalog(inner) => inner.is_not_found(),
            _ => false,
        }
    }
}
