//! # bomgraph-core
//!
//! The data model shared by every bomgraph crate.
//!
//! ```text
//! Item ──CoProcess──▶ CoItem ──(consumed by)──▶ Process ──▶ Item
//! ```
//!
//! Items are produced by processes and consumed through their co-items.
//! Each symbol is identified by a [`Digest`] over its canonical content.

pub mod digest;
pub mod error;
pub mod symbol;

pub use digest::{DIGEST_HEX_LEN, Digest, canonical_bytes, canonical_value};
pub use error::SymbolError;
pub use symbol::{
    BomLine, CoItem, CoProcess, Companion, Contract, DEFAULT_ROLE, Derivation, DerivationKind,
    FileReference, IMPLICIT_NAMESPACE, Item, ItemContent, Process, Symbol, SymbolKind,
    companion_qualifier, is_implicit,
};
