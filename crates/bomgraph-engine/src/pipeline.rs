//! End-to-end flows used by the CLI: commit sources, resolve a root,
//! build its tree, and produce a referenced graph.

use bomgraph_catalog::Catalog;
use bomgraph_core::{Digest, Item};
use bomgraph_source::{ROOT_MODULE, SourceTree};
use tracing::info;

use crate::build::Builder;
use crate::compile::Compiler;
use crate::error::EngineError;
use crate::graph::BomGraph;
use crate::ranker::ranker_for;
use crate::tree::BomTree;

/// Compile every block in `sources` into `catalog`.
pub fn commit(sources: &SourceTree, catalog: &mut Catalog) -> Result<Vec<Digest>, EngineError> {
    let digests = Compiler::new(&sources.symbols, catalog).compile_all()?;
    info!(symbols = digests.len(), objects = catalog.object_count(), "committed sources");
    Ok(digests)
}

/// Resolve a dotted root reference from the root module, compiling on
/// demand.
pub fn resolve_root(
    sources: &SourceTree,
    catalog: &mut Catalog,
    reference: &str,
) -> Result<Item, EngineError> {
    let path: Vec<String> = reference.split('.').map(str::to_string).collect();
    Compiler::new(&sources.symbols, catalog).resolve_item(ROOT_MODULE, &path)
}

/// Build the tree under `root` with the catalog's configured ranker.
pub fn build_tree(catalog: &Catalog, root: &Digest) -> Result<BomTree, EngineError> {
    let ranker = ranker_for(catalog.config().build.ranker);
    Builder::new(catalog, ranker.as_ref()).build(root)
}

/// Resolve, build, and reference the result against every `state` block
/// in declaration order.
pub fn build_graph(
    sources: &SourceTree,
    catalog: &mut Catalog,
    reference: &str,
) -> Result<(BomTree, BomGraph), EngineError> {
    let root = resolve_root(sources, catalog, reference)?;
    let tree = build_tree(catalog, &root.digest)?;
    let mut graph = BomGraph::from_tree(&tree)?;
    for state in &sources.states {
        let previous = BomGraph::load(&state.path)?;
        info!(state = %state.name, path = %state.path.display(), "referencing previous graph");
        graph = graph.reference(&previous);
    }
    Ok((tree, graph))
}
