use crate::cli::ReportFormat;
use crate::support::build_or_exit;
use bomgraph_engine::{render_delimited, render_json};

pub fn run(catalog: String, source: String, root: String, output: ReportFormat) {
    let (tree, graph) = build_or_exit(&catalog, &source, &root);
    let rows = graph.usage_rows();
    let rendered = match output {
        ReportFormat::Csv => render_delimited(&rows, ','),
        ReportFormat::Tsv => render_delimited(&rows, '\t'),
        ReportFormat::Tree => tree.render(),
        ReportFormat::Json => render_json(&rows)
            .map(|json| json + "\n")
            .unwrap_or_else(|e| {
                eprintln!("error: {e}");
                std::process::exit(1);
            }),
    };
    print!("{rendered}");
}
