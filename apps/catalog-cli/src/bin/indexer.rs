use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use catalog_cli::{init_tracing, load_config};
use catalog_index::{rebuild, spinner};

/// Rebuild the catalog index from the raw document directory.
#[derive(Debug, Parser)]
#[command(name = "catalog-indexer", version)]
struct Cli {
    /// Raw document directory (overrides `data.raw_dir`).
    #[arg(long)]
    input: Option<PathBuf>,

    /// Index file to write (overrides `data.index_path`).
    #[arg(long)]
    output: Option<PathBuf>,

    /// No progress spinner.
    #[arg(long, short)]
    quiet: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config()?;
    init_tracing(&config, cli.verbose);
    if let Some(input) = &cli.input {
        config.data.raw_dir = input.to_string_lossy().into_owned();
    }
    if let Some(output) = &cli.output {
        config.data.index_path = output.to_string_lossy().into_owned();
    }

    let report = rebuild(&config, (!cli.quiet).then(spinner))?;

    println!("Catalog indexer\n===============");
    println!("Input:    {}", config.raw_dir().display());
    println!("Output:   {}", config.index_path().display());
    println!("Files:    {} seen, {} loaded, {} skipped", report.files_seen, report.documents_loaded, report.files_skipped);
    println!("Entries:  {} ({} merges, {} conflicts)", report.entries, report.merges, report.conflicts);
    println!("No identifier: {} documents", report.documents_without_identifier);
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    Ok(())
}
