use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use catalog_cli::{init_tracing, load_config};
use catalog_core::error::Error;
use catalog_core::types::SearchQuery;

/// Query the catalog index and print matching entries as JSON.
#[derive(Debug, Parser)]
#[command(name = "catalog-search", version)]
struct Cli {
    /// Free-text query. May be empty when hints are given.
    #[arg(default_value = "")]
    query: String,

    /// Identifier to always include, ahead of keyword matches. Repeatable.
    #[arg(long = "hint", value_name = "SKU")]
    hints: Vec<String>,

    #[arg(long)]
    limit: Option<usize>,

    /// Index file (overrides `data.index_path`).
    #[arg(long)]
    index: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

const EXIT_NO_INDEX: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            match e.downcast_ref::<Error>() {
                Some(Error::IndexMissing { .. }) => {
                    eprintln!("Run catalog-indexer first.");
                    ExitCode::from(EXIT_NO_INDEX)
                }
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config()?;
    init_tracing(&config, cli.verbose);
    if let Some(path) = &cli.index {
        config.data.index_path = path.to_string_lossy().into_owned();
    }
    let index = catalog_index::open(&config)?;

    let mut query = SearchQuery::new(cli.query).with_hints(cli.hints);
    query.limit = config.effective_limit(cli.limit);
    let results = catalog_search::search(&index, &query);

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
