//! Load command implementation: restore a saved store and report its size.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use itemstore_core::{BootstrapReport, ItemStore, StorageFormat, load_at_start};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{ARG_BASE, ARG_STORAGE, CliError, DEFAULT_BASE};

/// CLI arguments for the `load` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Restore <base>.<storage> exactly as a serving process does \
                 at start-up and print how many items it holds. Unknown \
                 storage names fall back to `bytes`.",
    about = "Load a saved store"
)]
#[ortho_config(prefix = "ITEMSTORE")]
pub(crate) struct LoadArgs {
    /// Store file path without the format extension.
    #[arg(long = ARG_BASE, value_name = "path")]
    #[serde(default)]
    pub(crate) base: Option<Utf8PathBuf>,
    /// Storage format: `bytes`, `bytesz` or `json`.
    #[arg(long = ARG_STORAGE, value_name = "format")]
    #[serde(default)]
    pub(crate) storage: Option<String>,
}

impl LoadArgs {
    pub(crate) fn into_config(self) -> Result<LoadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(LoadConfig::from(merged))
    }
}

/// Resolved `load` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadConfig {
    /// Store file path without the format extension.
    pub(crate) base: Utf8PathBuf,
    /// Storage name as given; resolved during the load.
    pub(crate) storage: String,
}

impl From<LoadArgs> for LoadConfig {
    fn from(args: LoadArgs) -> Self {
        Self {
            base: args.base.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_BASE)),
            storage: args
                .storage
                .unwrap_or_else(|| StorageFormat::default().name().to_owned()),
        }
    }
}

pub(crate) fn run_load_with(args: LoadArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let (_store, report) = execute_load(&config)?;
    write_report(writer, &report)
}

pub(crate) fn execute_load(config: &LoadConfig) -> Result<(ItemStore, BootstrapReport), CliError> {
    let mut store = ItemStore::new();
    let report = load_at_start(&mut store, &config.storage, config.base.as_std_path(), true)?;
    Ok((store, report))
}

fn write_report(writer: &mut dyn Write, report: &BootstrapReport) -> Result<(), CliError> {
    writeln!(
        writer,
        "{} items loaded from {} as {} in {:?}",
        report.items_loaded,
        report.path.display(),
        report.format,
        report.elapsed
    )
    .map_err(CliError::WriteOutput)
}
