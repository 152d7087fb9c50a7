//! Facade crate for the item store.
//!
//! This crate re-exports the core store, index and persistence types and
//! exposes the ingestion worker behind the `ingest` feature.

#![forbid(unsafe_code)]

pub use itemstore_core::{
    BootstrapError, BootstrapReport, Item, ItemIn, ItemOut, ItemStore, Items, ItemsGroupedBy,
    ItemsIn, Label, ModelMaps, Snapshot, StorageError, StorageFormat, load_at_start,
};

#[cfg(feature = "ingest")]
pub use itemstore_ingest::{IngestError, IngestHandle, IngestReport, IngestWorker, spawn_worker};
