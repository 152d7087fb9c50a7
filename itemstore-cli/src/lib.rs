//! Command-line interface for loading, filling and saving an item store.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};

mod error;
mod ingest;
mod load;

pub use error::CliError;

use ingest::IngestArgs;
use load::LoadArgs;

const ARG_INPUT: &str = "input";
const ARG_BASE: &str = "base";
const ARG_STORAGE: &str = "storage";
const ARG_BATCH_SIZE: &str = "batch-size";
const ARG_LOAD_EXISTING: &str = "load-existing";
const ENV_INPUT: &str = "ITEMSTORE_CMDS_INGEST_INPUT";

const DEFAULT_BASE: &str = "items";
const DEFAULT_BATCH_SIZE: usize = 1000;

/// Run the item store CLI with the current process arguments and
/// environment, writing command summaries to standard output.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &mut stdout)
}

fn dispatch(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Ingest(args) => ingest::run_ingest_with(args, writer),
        Command::Load(args) => load::run_load_with(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "itemstore",
    about = "Ingest records into an item store and persist it between runs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Feed JSON-lines records through the ingestion worker and save the
    /// resulting store.
    Ingest(IngestArgs),
    /// Load a saved store and report how many items it holds.
    Load(LoadArgs),
}

#[cfg(test)]
mod tests;
