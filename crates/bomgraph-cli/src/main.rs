//! bomgraph CLI: the `bomgraph` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => commands::init::run(cli.catalog),

        Commands::Commit { source } => commands::commit::run(cli.catalog, source),

        Commands::Bom {
            source,
            root,
            output,
        } => commands::bom::run(cli.catalog, source, root, output),

        Commands::Build {
            source,
            root,
            output,
        } => commands::build::run(cli.catalog, source, root, output),

        Commands::Export { source, root } => commands::export::run(cli.catalog, source, root),
    }
}
