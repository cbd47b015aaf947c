//! Error types for symbol serialization and typing.

use crate::symbol::SymbolKind;

/// Errors raised while hashing, encoding, or decoding symbols.
#[derive(Debug, thiserror::Error)]
pub enum SymbolError {
    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("failed to decode {kind} {digest}: {message}")]
    Deserialize {
        kind: SymbolKind,
        digest: String,
        message: String,
    },

    /// A digest resolved to a symbol of an unexpected kind.
    #[error("type mismatch for {digest}: expected {expected}, found {actual}")]
    TypeMismatch {
        digest: String,
        expected: SymbolKind,
        actual: SymbolKind,
    },

    #[error("invalid digest: {0:?}")]
    InvalidDigest(String),

    #[error("unknown symbol kind: {0:?}")]
    UnknownKind(String),
}
