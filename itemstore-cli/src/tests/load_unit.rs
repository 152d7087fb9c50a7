//! Focused unit tests covering the load command.

use super::helpers::Workspace;
use crate::CliError;
use crate::load::{LoadArgs, LoadConfig, execute_load};
use camino::Utf8PathBuf;
use itemstore_core::{ItemStore, StorageError, StorageFormat};
use rstest::rstest;

#[rstest]
fn converting_applies_defaults() {
    let config = LoadConfig::from(LoadArgs::default());
    assert_eq!(config.base, Utf8PathBuf::from("items"));
    assert_eq!(config.storage, "bytes");
}

#[rstest]
fn unknown_storage_reads_the_bytes_file() {
    let workspace = Workspace::new();
    let base = workspace.root.join("items");
    let path = StorageFormat::Bytes.file_name(base.as_std_path());
    StorageFormat::Bytes
        .save(&ItemStore::new(), &path)
        .expect("save empty store");

    let (store, report) = execute_load(&LoadConfig {
        base: base.clone(),
        storage: "gob".to_owned(),
    })
    .expect("load falls back to bytes");
    assert!(store.is_empty());
    assert_eq!(report.format, StorageFormat::Bytes);
    assert_eq!(report.path, base.as_std_path().with_extension("bytes"));
}

#[rstest]
fn missing_store_is_a_fatal_bootstrap_error() {
    let workspace = Workspace::new();
    let err = execute_load(&LoadConfig {
        base: workspace.root.join("absent"),
        storage: "json".to_owned(),
    })
    .expect_err("nothing to load");

    assert!(err.is_fatal());
    match err {
        CliError::Bootstrap(bootstrap) => {
            assert!(matches!(bootstrap.source, StorageError::Read { .. }));
        }
        other => panic!("expected Bootstrap, found {other:?}"),
    }
}
