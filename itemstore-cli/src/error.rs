//! Error types emitted by the item store CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use itemstore_core::{BootstrapError, StorageError};
use itemstore_ingest::IngestError;
use thiserror::Error;

/// Errors emitted by the item store CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk or is not a file.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening or reading the record input failed.
    #[error("failed to read records from {path:?}: {source}")]
    ReadInput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A record line is neither blank, `null` nor a JSON record.
    #[error("invalid record on line {line} of {path:?}: {source}")]
    ParseRecord {
        path: Utf8PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    /// The async runtime driving the worker could not start.
    #[error("failed to start the ingestion runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The task reading records panicked or was cancelled. The worker and
    /// the records it already accepted are unaffected.
    #[error("record reader failed: {0}")]
    Producer(#[source] tokio::task::JoinError),
    /// The initial store state could not be loaded.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// Ingestion stopped before the input was consumed.
    #[error(transparent)]
    Ingest(#[from] IngestError),
    /// The directory for the store file could not be created.
    #[error("failed to prepare store path {path:?}: {source}")]
    PrepareStorePath {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Saving the store failed.
    #[error("failed to save store: {0}")]
    Save(#[from] StorageError),
    /// Writing the command summary failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}

impl CliError {
    /// Whether the failure leaves no trustworthy store state behind, so the
    /// process must abort rather than carry on.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Bootstrap(_) => true,
            Self::Ingest(err) => err.is_fatal(),
            _ => false,
        }
    }
}
