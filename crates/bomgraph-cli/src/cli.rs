use clap::{Parser, Subcommand, ValueEnum};

use crate::support::DEFAULT_CATALOG;

#[derive(Parser)]
#[command(
    name = "bomgraph",
    about = "bomgraph: bills of materials over a content-addressed catalog",
    version
)]
pub struct Cli {
    /// Catalog directory
    #[arg(long, global = true, default_value = DEFAULT_CATALOG)]
    pub catalog: String,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the catalog layout and default config
    Init,

    /// Compile every block under a source path into the catalog
    Commit {
        /// Source folder or `.bpo` file
        source: String,
    },

    /// Print the flattened usage report for a root item
    Bom {
        /// Source folder or `.bpo` file
        source: String,

        /// Root item reference (dotted path)
        root: String,

        /// Report format
        #[arg(long, short, value_enum, default_value_t = ReportFormat::Csv)]
        output: ReportFormat,
    },

    /// Build a root item and write its graph artifact
    Build {
        /// Source folder or `.bpo` file
        source: String,

        /// Root item reference (dotted path)
        root: String,

        /// Artifact path; defaults to the source path with a `.bpc` extension
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Print parent:child digest edges of a root item's tree
    Export {
        /// Source folder or `.bpo` file
        source: String,

        /// Root item reference (dotted path)
        root: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Tsv,
    Json,
    Tree,
}
