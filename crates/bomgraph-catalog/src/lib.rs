//! # bomgraph-catalog
//!
//! Content-addressed storage for bomgraph symbols.
//!
//! Objects are written once under `objects/<shard>/<digest>` with a
//! crash-durable rename. Three append-only logs map qualifiers to digests,
//! digests to kinds, and outputs to the recipes that produce them. The logs
//! are derived data and are replayed into memory when a catalog opens.

pub mod atomic;
pub mod config;
pub mod error;
pub mod index;
pub mod store;

pub use config::{BuildSection, CONFIG_FILE, CatalogConfig, RankerPolicy, StoreSection};
pub use error::CatalogError;
pub use store::{Catalog, OBJECTS_DIR};
