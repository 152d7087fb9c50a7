//! Loading the initial store state at process start.
//!
//! A failed bootstrap load is not recoverable: serving without state is worse
//! than not starting. [`load_at_start`] therefore reports failures as a
//! [`BootstrapError`] that the process entrypoint turns into an exit.

use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use log::info;
use thiserror::Error;

use crate::{ItemStore, StorageError, StorageFormat};

/// Outcome of a successful bootstrap load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Format the file was read with.
    pub format: StorageFormat,
    /// File that was read.
    pub path: PathBuf,
    /// Items held by the store afterwards.
    pub items_loaded: usize,
    /// Wall-clock time spent loading and restoring.
    pub elapsed: Duration,
}

/// The initial state could not be loaded; the process must not serve.
#[derive(Debug, Error)]
#[error("could not load initial state from {path:?} as {format}: {source}")]
pub struct BootstrapError {
    /// Format the load was attempted with.
    pub format: StorageFormat,
    /// File the load was attempted from.
    pub path: PathBuf,
    /// Underlying storage failure.
    #[source]
    pub source: StorageError,
}

/// Load `<base>.<storage_name>` into `store`.
///
/// Unknown storage names fall back to `bytes` with a warning, and the derived
/// file name follows the fallback. Index reconstruction always happens as
/// part of the restore; `indexed` only controls whether the rebuilt index
/// sizes are logged.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use itemstore_core::{ItemStore, load_at_start};
///
/// let mut store = ItemStore::new();
/// let report = load_at_start(&mut store, "bytesz", Path::new("items"), true)?;
/// assert_eq!(report.items_loaded, store.len());
/// # Ok::<(), itemstore_core::BootstrapError>(())
/// ```
pub fn load_at_start(
    store: &mut ItemStore,
    storage_name: &str,
    base: &Path,
    indexed: bool,
) -> Result<BootstrapReport, BootstrapError> {
    let format = StorageFormat::resolve(storage_name);
    let path = format.file_name(base);
    info!("Retrieving with {format} from {}", path.display());

    let start = Instant::now();
    let items_loaded = format
        .load(store, &path)
        .map_err(|source| BootstrapError {
            format,
            path: path.clone(),
            source,
        })?;
    let elapsed = start.elapsed();

    info!("Loaded {items_loaded} items in {elapsed:?}");
    if indexed {
        info!(
            "Rebuilt {} column bitsets and {} geo entries",
            store.columns().len(),
            store.geo().len()
        );
    }

    Ok(BootstrapReport {
        format,
        path,
        items_loaded,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{populate, sample_inputs};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn saved() -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let base = dir.path().join("items");
        let mut store = ItemStore::new();
        populate(&mut store, sample_inputs());
        for format in StorageFormat::ALL {
            format
                .save(&store, &format.file_name(&base))
                .expect("save fixture store");
        }
        (dir, base)
    }

    #[rstest]
    #[case("bytes", StorageFormat::Bytes)]
    #[case("bytesz", StorageFormat::BytesZ)]
    #[case("json", StorageFormat::Json)]
    fn loads_requested_format(
        #[from(saved)] (_dir, base): (TempDir, PathBuf),
        #[case] name: &str,
        #[case] expected: StorageFormat,
    ) {
        let mut store = ItemStore::new();
        let report = load_at_start(&mut store, name, &base, true).expect("bootstrap load");

        assert_eq!(report.format, expected);
        assert_eq!(report.path, expected.file_name(&base));
        assert_eq!(report.items_loaded, 3);
        assert_eq!(store.len(), 3);
    }

    #[rstest]
    fn unknown_format_falls_back_to_bytes_file(
        #[from(saved)] (_dir, base): (TempDir, PathBuf),
    ) {
        let mut store = ItemStore::new();
        let report = load_at_start(&mut store, "gob", &base, false).expect("bootstrap load");

        assert_eq!(report.format, StorageFormat::Bytes);
        assert_eq!(report.path, base.with_extension("bytes"));
        assert_eq!(store.len(), 3);
    }

    #[rstest]
    fn missing_file_is_a_bootstrap_error() {
        let dir = TempDir::new().expect("create temp dir");
        let mut store = ItemStore::new();
        let error = load_at_start(&mut store, "bytesz", &dir.path().join("absent"), true)
            .expect_err("missing file should fail");

        assert_eq!(error.format, StorageFormat::BytesZ);
        assert!(matches!(error.source, StorageError::Read { .. }));
        assert!(store.is_empty());
    }

    #[rstest]
    fn corrupt_file_is_a_bootstrap_error(#[from(saved)] (_dir, base): (TempDir, PathBuf)) {
        std::fs::write(StorageFormat::Json.file_name(&base), b"{}").expect("corrupt file");
        let mut store = ItemStore::new();
        let error = load_at_start(&mut store, "json", &base, true)
            .expect_err("corrupt file should fail");
        assert!(matches!(error.source, StorageError::Decode { .. }));
    }
}
