//! # bomgraph-engine
//!
//! Turns raw source blocks into catalog symbols and catalog symbols into
//! bills of materials.
//!
//! ```text
//! SymbolTable ──compile──▶ Catalog ──build──▶ BomTree ──▶ BomGraph
//!                                                           │
//!                                      previous BomGraph ──reference──▶ BomGraph
//! ```
//!
//! Builds choose one recipe per output through a [`Ranker`]. Graphs give
//! items and nodes uuid identities that [`BomGraph::reference`] carries
//! across rebuilds.

pub mod build;
pub mod compile;
pub mod error;
pub mod graph;
pub mod matching;
pub mod pipeline;
pub mod ranker;
pub mod reference;
pub mod report;
pub mod tree;

pub use build::Builder;
pub use compile::{Compiler, FILE_REF_PREFIX};
pub use error::EngineError;
pub use graph::{BomGraph, GraphItem, GraphNode, generate_part_number};
pub use matching::{edit_distance, greedy_match};
pub use pipeline::{build_graph, build_tree, commit, resolve_root};
pub use ranker::{FirstDeclared, Ranker, ShortestCycleTime, ranker_for};
pub use report::{UsageRow, render_delimited, render_json};
pub use tree::{BomTree, Node, NodeIndex};
