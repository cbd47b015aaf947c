use bomgraph_catalog::Catalog;
use bomgraph_engine::{BomGraph, BomTree, build_graph, commit};
use bomgraph_source::{EXTENSION, SourceTree, load};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_CATALOG: &str = ".bomgraph";
pub const ARTIFACT_EXTENSION: &str = "bpc";
pub const DEFAULT_ARTIFACT: &str = "output.bpc";

/// Open the catalog, creating it on first use.
pub fn open_catalog_or_exit(path: &str) -> Catalog {
    let root = Path::new(path);
    let opened = if root.is_dir() {
        Catalog::open(root)
    } else {
        info!(catalog = %root.display(), "creating catalog");
        Catalog::init(root)
    };
    opened.unwrap_or_else(|e| {
        eprintln!("error: failed to open catalog {path}: {e}");
        std::process::exit(1);
    })
}

pub fn load_sources_or_exit(source: &str) -> SourceTree {
    load(source).unwrap_or_else(|e| {
        eprintln!("error: failed to load {source}: {e}");
        std::process::exit(1);
    })
}

/// Load and commit `source`, then build the graph rooted at `root`.
pub fn build_or_exit(catalog: &str, source: &str, root: &str) -> (BomTree, BomGraph) {
    let mut catalog = open_catalog_or_exit(catalog);
    let sources = load_sources_or_exit(source);
    commit(&sources, &mut catalog)
        .and_then(|_| build_graph(&sources, &mut catalog, root))
        .unwrap_or_else(|e| {
            eprintln!("error: failed to build {root}: {e}");
            std::process::exit(1);
        })
}

/// `bike.bpo` becomes `bike.bpc`; anything else becomes `output.bpc`.
pub fn default_artifact_path(source: &str) -> PathBuf {
    let path = Path::new(source);
    if path.extension().is_some_and(|ext| ext == EXTENSION) {
        path.with_extension(ARTIFACT_EXTENSION)
    } else {
        PathBuf::from(DEFAULT_ARTIFACT)
    }
}
