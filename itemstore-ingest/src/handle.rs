//! Spawning the worker and feeding it batches.

use itemstore_core::{ItemStore, ItemsIn};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{IngestError, IngestReport, IngestWorker};

/// Batches buffered between producers and the worker by default.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Producer side of a running worker.
///
/// Cloned senders may be handed to further producers. The worker stops once
/// this handle has been finished and every cloned sender dropped.
#[derive(Debug)]
pub struct IngestHandle {
    sender: mpsc::Sender<ItemsIn>,
    task: JoinHandle<Result<(ItemStore, IngestReport), IngestError>>,
}

/// Spawn `worker` as the single consumer of a bounded channel holding up to
/// `capacity` batches.
///
/// A capacity of zero is raised to one. Must be called from within a Tokio
/// runtime.
#[must_use]
pub fn spawn_worker(worker: IngestWorker, capacity: usize) -> IngestHandle {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(worker.run(receiver));
    IngestHandle { sender, task }
}

impl IngestHandle {
    /// A sender for an additional producer.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<ItemsIn> {
        self.sender.clone()
    }

    /// Queue `batch`, waiting for channel capacity.
    ///
    /// Fails with [`IngestError::WorkerStopped`] when the worker has exited;
    /// [`IngestHandle::finish`] then reports why.
    pub async fn send(&self, batch: ItemsIn) -> Result<(), IngestError> {
        self.sender
            .send(batch)
            .await
            .map_err(|_| IngestError::WorkerStopped)
    }

    /// Close this handle's sender and wait for the worker to drain the
    /// channel, returning the store and the final counters.
    pub async fn finish(self) -> Result<(ItemStore, IngestReport), IngestError> {
        let Self { sender, task } = self;
        drop(sender);
        task.await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemstore_core::test_support::{batch_with_gap, populate, sample_inputs};
    use itemstore_core::Label;
    use rstest::rstest;

    #[tokio::test]
    async fn finish_returns_filled_store() {
        let handle = spawn_worker(IngestWorker::new(ItemStore::new()), 0);
        handle.send(batch_with_gap()).await.expect("send batch");
        let extra = handle.sender();
        extra
            .send(vec![sample_inputs().into_iter().next()])
            .await
            .expect("send through clone");
        drop(extra);

        let (store, report) = handle.finish().await.expect("worker succeeds");
        assert_eq!(store.len(), 3);
        assert_eq!(report.accepted, 3);
        assert_eq!(report.batches, 2);
        assert!(store.get(Label::new(2)).is_some());
    }

    #[tokio::test]
    async fn send_after_fatal_error_reports_stopped_worker() {
        let mut store = ItemStore::new();
        populate(&mut store, sample_inputs());
        let handle = spawn_worker(IngestWorker::new(store), 1);

        handle.send(batch_with_gap()).await.expect("first send");
        let mut outcome = Ok(());
        for _ in 0..8 {
            outcome = handle.send(vec![None]).await;
            if outcome.is_err() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(matches!(outcome, Err(IngestError::WorkerStopped)));

        let error = handle.finish().await.expect_err("worker fails");
        assert!(matches!(error, IngestError::LabelSlotMismatch { .. }));
    }

    #[rstest]
    fn fatal_kinds_are_flagged() {
        assert!(!IngestError::WorkerStopped.is_fatal());
        assert!(
            IngestError::LabelSlotMismatch {
                label: Label::ZERO,
                len: 2,
            }
            .is_fatal()
        );
    }
}
