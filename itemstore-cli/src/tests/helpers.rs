//! Test helpers for writing record files into a scratch workspace.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

use crate::ingest::IngestConfig;
use itemstore_core::StorageFormat;

pub(super) const RECORDS: &str = concat!(
    r#"{"fields":{"name":"Brew","kind":"cafe"},"location":{"x":4.9,"y":52.37}}"#,
    "\n",
    "null\n",
    "\n",
    r#"{"fields":{"name":"Grind","kind":"cafe"}}"#,
    "\n",
    r#"{"fields":{"name":"Vondelpark","kind":"park"},"location":{"x":4.87,"y":52.36}}"#,
    "\n",
);

pub(super) struct Workspace {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        write_utf8(&path, contents.as_bytes());
        path
    }

    pub(super) fn config(&self, input: Utf8PathBuf, format: StorageFormat) -> IngestConfig {
        IngestConfig {
            input,
            base: self.root.join("state/items"),
            format,
            batch_size: 2,
            load_existing: false,
        }
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write test file");
}
