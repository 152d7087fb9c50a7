//! Sequential-label ingestion for the item store.
//!
//! A single [`IngestWorker`] consumes batches of raw records from a bounded
//! channel, shrinks each record into its stored form under the next label and
//! publishes it into the store's collection and indexes. The worker owns the
//! [`ItemStore`](itemstore_core::ItemStore) while it runs, which makes it the
//! only writer; the store is handed back once every sender has been dropped.
//!
//! ```
//! use itemstore_core::{ItemIn, ItemStore};
//! use itemstore_ingest::{IngestWorker, spawn_worker};
//!
//! # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
//! let handle = spawn_worker(IngestWorker::new(ItemStore::new()), 4);
//! handle
//!     .send(vec![Some(ItemIn::new([("name", "Brew")], None)), None])
//!     .await?;
//! let (store, report) = handle.finish().await?;
//! assert_eq!(store.len(), 1);
//! assert_eq!(report.skipped, 1);
//! # Ok::<(), itemstore_ingest::IngestError>(())
//! # })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

mod handle;
mod worker;

use itemstore_core::Label;
use thiserror::Error;

pub use handle::{DEFAULT_CHANNEL_CAPACITY, IngestHandle, spawn_worker};
pub use worker::IngestWorker;

/// Errors raised while ingesting records.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A freshly appended record does not sit at the slot named by its label.
    /// The collection is corrupt and the process must not continue.
    #[error("label {label} does not match its slot; collection holds {len} items")]
    LabelSlotMismatch {
        /// Label assigned to the record.
        label: Label,
        /// Collection length after the append.
        len: usize,
    },
    /// The worker has already stopped and no longer accepts batches.
    #[error("ingestion worker has stopped")]
    WorkerStopped,
    /// The worker task panicked or was cancelled.
    #[error("ingestion worker failed: {0}")]
    WorkerFailed(#[from] tokio::task::JoinError),
}

impl IngestError {
    /// Whether the error leaves the store in a state that must not be served.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::LabelSlotMismatch { .. } | Self::WorkerFailed(_))
    }
}

/// Counters collected over the lifetime of a worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records shrunk and appended.
    pub accepted: usize,
    /// Empty entries passed over.
    pub skipped: usize,
    /// Batches consumed.
    pub batches: usize,
}
