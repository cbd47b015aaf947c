use crate::support::{build_or_exit, default_artifact_path};
use std::path::PathBuf;

pub fn run(catalog: String, source: String, root: String, output: Option<String>) {
    let (tree, graph) = build_or_exit(&catalog, &source, &root);
    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_artifact_path(&source));
    if let Err(e) = graph.save(&path) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    println!("bomgraph build {root}");
    println!();
    println!("  artifact: {}", path.display());
    println!("  nodes: {}", tree.len());
    println!("  items: {}", graph.items.len());
}
