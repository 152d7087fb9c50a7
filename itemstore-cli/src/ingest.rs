//! Ingest command implementation: feed JSON-lines records through the worker
//! and save the resulting store.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use itemstore_core::{ItemIn, ItemStore, ItemsIn, StorageFormat, load_at_start};
use itemstore_ingest::{
    DEFAULT_CHANNEL_CAPACITY, IngestError, IngestReport, IngestWorker, spawn_worker,
};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{
    ARG_BASE, ARG_BATCH_SIZE, ARG_INPUT, ARG_LOAD_EXISTING, ARG_STORAGE, CliError, DEFAULT_BASE,
    DEFAULT_BATCH_SIZE, ENV_INPUT,
};

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Read one JSON record per line, ingest the records in \
                 batches and save the store as <base>.<storage>. Blank and \
                 `null` lines are counted as skipped entries.",
    about = "Ingest JSON-lines records and save the store"
)]
#[ortho_config(prefix = "ITEMSTORE")]
pub(crate) struct IngestArgs {
    /// Path to the JSON-lines record file.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Store file path without the format extension.
    #[arg(long = ARG_BASE, value_name = "path")]
    #[serde(default)]
    pub(crate) base: Option<Utf8PathBuf>,
    /// Storage format: `bytes`, `bytesz` or `json`.
    #[arg(long = ARG_STORAGE, value_name = "format")]
    #[serde(default)]
    pub(crate) storage: Option<String>,
    /// Records per batch handed to the worker.
    #[arg(long = ARG_BATCH_SIZE, value_name = "count")]
    #[serde(default)]
    pub(crate) batch_size: Option<usize>,
    /// Restore the saved store first and append to it.
    #[arg(
        long = ARG_LOAD_EXISTING,
        num_args = 0..=1,
        default_missing_value = "true",
        value_name = "bool"
    )]
    #[serde(default)]
    pub(crate) load_existing: Option<bool>,
}

impl IngestArgs {
    pub(crate) fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestConfig::try_from(merged)
    }
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestConfig {
    /// JSON-lines record file.
    pub(crate) input: Utf8PathBuf,
    /// Store file path without the format extension.
    pub(crate) base: Utf8PathBuf,
    /// Format used for the optional initial load and the final save.
    pub(crate) format: StorageFormat,
    /// Records per batch, at least one.
    pub(crate) batch_size: usize,
    /// Whether to restore the saved store before ingesting.
    pub(crate) load_existing: bool,
}

impl IngestConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        match itemstore_fs::regular_file_exists(&self.input) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::MissingSourceFile {
                field: ARG_INPUT,
                path: self.input.clone(),
            }),
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_INPUT,
                path: self.input.clone(),
                source,
            }),
        }
    }

    pub(crate) fn store_path(&self) -> PathBuf {
        self.format.file_name(self.base.as_std_path())
    }
}

impl TryFrom<IngestArgs> for IngestConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_INPUT,
        })?;
        let format = args
            .storage
            .as_deref()
            .map_or_else(StorageFormat::default, StorageFormat::resolve);
        Ok(Self {
            input,
            base: args.base.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_BASE)),
            format,
            batch_size: args.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1),
            load_existing: args.load_existing.unwrap_or(false),
        })
    }
}

/// What an `ingest` run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestSummary {
    /// Worker counters for this run.
    pub(crate) report: IngestReport,
    /// Items in the saved store, including restored ones.
    pub(crate) items: usize,
    /// File the store was saved to.
    pub(crate) path: PathBuf,
    /// Size of the saved file.
    pub(crate) bytes: u64,
}

pub(crate) fn run_ingest_with(args: IngestArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let summary = execute_ingest(&config)?;
    write_summary(writer, &summary)
}

pub(crate) fn execute_ingest(config: &IngestConfig) -> Result<IngestSummary, CliError> {
    let mut store = ItemStore::new();
    if config.load_existing {
        load_at_start(&mut store, config.format.name(), config.base.as_std_path(), true)?;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let worker = IngestWorker::resume(store);
    let (filled, report) = runtime.block_on(ingest_records(worker, config))?;

    itemstore_fs::prepare_store_path(&config.base).map_err(|source| CliError::PrepareStorePath {
        path: config.base.clone(),
        source,
    })?;
    let path = config.store_path();
    let bytes = config.format.save(&filled, &path)?;
    info!(
        "Ingested {} records ({} skipped) in {} batches",
        report.accepted, report.skipped, report.batches
    );
    Ok(IngestSummary {
        report,
        items: filled.len(),
        path,
        bytes,
    })
}

async fn ingest_records(
    worker: IngestWorker,
    config: &IngestConfig,
) -> Result<(ItemStore, IngestReport), CliError> {
    let handle = spawn_worker(worker, DEFAULT_CHANNEL_CAPACITY);
    let sender = handle.sender();
    let input = config.input.clone();
    let batch_size = config.batch_size;
    let produced = tokio::task::spawn_blocking(move || produce(&input, batch_size, &sender))
        .await
        .map_err(CliError::Producer)?;

    // A stopped worker explains a failed send, so its outcome is reported
    // before the producer's.
    let finished = handle.finish().await?;
    produced?;
    Ok(finished)
}

fn produce(
    path: &Utf8Path,
    batch_size: usize,
    sender: &mpsc::Sender<ItemsIn>,
) -> Result<(), CliError> {
    let read_error = |source| CliError::ReadInput {
        path: path.to_path_buf(),
        source,
    };
    let file = itemstore_fs::open_input(path).map_err(read_error)?;

    let mut batch = ItemsIn::with_capacity(batch_size);
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let text = line.map_err(read_error)?;
        let record = parse_record(&text).map_err(|source| CliError::ParseRecord {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        batch.push(record);
        if batch.len() >= batch_size {
            let full = std::mem::replace(&mut batch, ItemsIn::with_capacity(batch_size));
            send(sender, full)?;
        }
    }
    if !batch.is_empty() {
        send(sender, batch)?;
    }
    Ok(())
}

fn send(sender: &mpsc::Sender<ItemsIn>, batch: ItemsIn) -> Result<(), CliError> {
    sender
        .blocking_send(batch)
        .map_err(|_| CliError::Ingest(IngestError::WorkerStopped))
}

/// Parse one input line. Blank lines and `null` stand for absent records.
pub(crate) fn parse_record(line: &str) -> Result<Option<ItemIn>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
}

fn write_summary(writer: &mut dyn Write, summary: &IngestSummary) -> Result<(), CliError> {
    writeln!(
        writer,
        "ingested {} records ({} skipped); {} items saved to {} ({} bytes)",
        summary.report.accepted,
        summary.report.skipped,
        summary.items,
        summary.path.display(),
        summary.bytes
    )
    .map_err(CliError::WriteOutput)
}
