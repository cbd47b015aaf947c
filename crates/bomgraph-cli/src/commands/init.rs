use bomgraph_catalog::{CONFIG_FILE, Catalog};

pub fn run(catalog: String) {
    let opened = Catalog::init(&catalog).unwrap_or_else(|e| {
        eprintln!("error: failed to initialize {catalog}: {e}");
        std::process::exit(1);
    });

    println!("bomgraph init {catalog}");
    println!();
    println!("  catalog: {}", opened.root().display());
    println!("  config: {}", opened.root().join(CONFIG_FILE).display());
    println!("  ranker: {:?}", opened.config().build.ranker);
    println!("  objects: {}", opened.object_count());
}
