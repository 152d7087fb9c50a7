//! The single consumer that assigns labels and publishes stored records.

use std::sync::Arc;

use itemstore_core::{ItemIn, ItemStore, ItemsIn, Label};
use log::{debug, info};
use tokio::sync::mpsc;

use crate::{IngestError, IngestReport};

/// Owns the store and the label counter while records are ingested.
#[derive(Debug)]
pub struct IngestWorker {
    store: ItemStore,
    next_label: Label,
    report: IngestReport,
}

impl IngestWorker {
    /// Start labelling at zero.
    ///
    /// The store is expected to be empty; ingesting into a populated store
    /// this way fails the slot check on the first record. Use
    /// [`IngestWorker::resume`] to append after a restore.
    #[must_use]
    pub fn new(store: ItemStore) -> Self {
        Self {
            store,
            next_label: Label::ZERO,
            report: IngestReport::default(),
        }
    }

    /// Start labelling at the current collection length.
    #[must_use]
    pub fn resume(store: ItemStore) -> Self {
        let next_label = Label::new(store.len());
        Self {
            store,
            next_label,
            report: IngestReport::default(),
        }
    }

    /// Label the next accepted record will receive.
    #[must_use]
    pub const fn next_label(&self) -> Label {
        self.next_label
    }

    /// Store being filled.
    #[must_use]
    pub const fn store(&self) -> &ItemStore {
        &self.store
    }

    /// Counters so far.
    #[must_use]
    pub const fn report(&self) -> IngestReport {
        self.report
    }

    /// Ingest every present record of `batch` in order, skipping empty
    /// entries.
    ///
    /// Stops at the first record whose label does not match its slot; the
    /// records before it stay published.
    pub fn ingest_batch(&mut self, batch: ItemsIn) -> Result<(), IngestError> {
        for entry in batch {
            match entry {
                Some(input) => self.ingest_one(&input)?,
                None => self.report.skipped += 1,
            }
        }
        self.report.batches += 1;
        Ok(())
    }

    fn ingest_one(&mut self, input: &ItemIn) -> Result<(), IngestError> {
        let label = self.next_label;
        let shrunk = self.store.shrink(input, label);
        self.store.build_columns(&shrunk);
        let item = Arc::new(shrunk);
        self.store.append(Arc::clone(&item));

        let in_place = self
            .store
            .get(label)
            .is_some_and(|stored| Arc::ptr_eq(stored, &item));
        if !in_place {
            return Err(IngestError::LabelSlotMismatch {
                label,
                len: self.store.len(),
            });
        }

        self.store.build_geo_index_entry(&item);
        self.next_label = label.next();
        self.report.accepted += 1;
        Ok(())
    }

    /// Consume batches until every sender is dropped, then hand the store
    /// back with the final counters.
    pub async fn run(
        mut self,
        mut batches: mpsc::Receiver<ItemsIn>,
    ) -> Result<(ItemStore, IngestReport), IngestError> {
        while let Some(batch) = batches.recv().await {
            debug!("Ingesting batch of {} entries", batch.len());
            self.ingest_batch(batch)?;
        }
        info!(
            "Ingestion finished: {} accepted, {} skipped over {} batches",
            self.report.accepted, self.report.skipped, self.report.batches
        );
        Ok(self.into_parts())
    }

    /// Hand back the store and the counters.
    #[must_use]
    pub fn into_parts(self) -> (ItemStore, IngestReport) {
        (self.store, self.report)
    }
}
