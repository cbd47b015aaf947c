use crate::support::{load_sources_or_exit, open_catalog_or_exit};
use bomgraph_engine::commit;

pub fn run(catalog: String, source: String) {
    let mut opened = open_catalog_or_exit(&catalog);
    let sources = load_sources_or_exit(&source);
    let digests = commit(&sources, &mut opened).unwrap_or_else(|e| {
        eprintln!("error: failed to commit {source}: {e}");
        std::process::exit(1);
    });

    println!("bomgraph commit {source}");
    println!();
    println!("  files: {}", sources.files.len());
    println!("  symbols: {}", digests.len());
    println!("  objects: {}", opened.object_count());
}
