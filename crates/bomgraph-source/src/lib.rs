//! # bomgraph-source
//!
//! Reads `.bpo` source trees into a symbol table of raw blocks.
//!
//! ```text
//! files ──parse──▶ Block ──loader──▶ SymbolTable (modules + imports)
//! ```
//!
//! Nothing here touches the catalog. Blocks stay raw until the engine
//! compiles them on demand.

pub mod block;
pub mod error;
pub mod loader;
pub mod parse;
pub mod symbols;

pub use block::{Block, Value};
pub use error::SourceError;
pub use loader::{EXTENSION, SYMBOL_KINDS, SourceTree, StateRef, load, validate_import, validate_label};
pub use parse::{parse_file, parse_str};
pub use symbols::{
    Entry, ModuleId, ParserContext, ROOT_MODULE, SymbolId, SymbolTable, qualify,
};
