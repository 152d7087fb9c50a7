//! Persisted store formats.
//!
//! Each [`StorageFormat`] pairs a save path (snapshot, encode, write) with a
//! load path (read, decode, restore). Files are named `<base>.<format>`:
//!
//! | format | bytes on disk |
//! |---|---|
//! | `bytes` | `bincode` snapshot |
//! | `bytesz` | gzip of the `bincode` snapshot |
//! | `json` | gzip of the JSON snapshot |

use std::{
    ffi::OsString,
    fmt,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use log::{info, warn};
use thiserror::Error;

use crate::store::MisplacedItem;
use crate::{ItemStore, Snapshot};

pub mod codec;

pub use codec::CodecError;

/// Supported on-disk representations of a [`Snapshot`].
///
/// # Examples
/// ```
/// use std::path::Path;
/// use itemstore_core::StorageFormat;
///
/// let format: StorageFormat = "bytesz".parse()?;
/// assert_eq!(format.file_name(Path::new("items")), Path::new("items.bytesz"));
/// assert_eq!(StorageFormat::resolve("zip"), StorageFormat::Bytes);
/// # Ok::<(), itemstore_core::UnknownStorageFormat>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageFormat {
    /// Plain `bincode`.
    #[default]
    Bytes,
    /// Gzip-compressed `bincode`.
    BytesZ,
    /// Gzip-compressed JSON.
    Json,
}

/// A format name that is not one of `bytes`, `bytesz` or `json`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown storage format `{0}`")]
pub struct UnknownStorageFormat(pub String);

impl FromStr for StorageFormat {
    type Err = UnknownStorageFormat;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.name() == name)
            .ok_or_else(|| UnknownStorageFormat(name.to_owned()))
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure while saving or loading a store file.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The file could not be read.
    #[error("failed to read {path:?}: {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file could not be written.
    #[error("failed to write {path:?}: {source}")]
    Write {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The snapshot could not be encoded.
    #[error("failed to encode snapshot as {format} for {path:?}: {source}")]
    Encode {
        /// Destination file.
        path: PathBuf,
        /// Format in use.
        format: StorageFormat,
        /// Codec failure.
        #[source]
        source: CodecError,
    },
    /// The file contents could not be decoded.
    #[error("failed to decode {format} snapshot from {path:?}: {source}")]
    Decode {
        /// Source file.
        path: PathBuf,
        /// Format in use.
        format: StorageFormat,
        /// Codec failure.
        #[source]
        source: CodecError,
    },
    /// The decoded collection breaks the label/slot invariant.
    #[error("snapshot in {path:?} is inconsistent: {source}")]
    Inconsistent {
        /// Source file.
        path: PathBuf,
        /// First misplaced item.
        #[source]
        source: MisplacedItem,
    },
}

impl StorageFormat {
    /// Every supported format.
    pub const ALL: [Self; 3] = [Self::Bytes, Self::BytesZ, Self::Json];

    /// Name used on the command line and as the file extension.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bytes => "bytes",
            Self::BytesZ => "bytesz",
            Self::Json => "json",
        }
    }

    /// Parse `name`, falling back to [`StorageFormat::Bytes`] with a warning
    /// when it is not a known format.
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: UnknownStorageFormat| {
            warn!("{err}; falling back to {}", Self::default());
            Self::default()
        })
    }

    /// Derive `<base>.<format>`.
    #[must_use]
    pub fn file_name(self, base: &Path) -> PathBuf {
        let mut name = OsString::from(base.as_os_str());
        name.push(".");
        name.push(self.name());
        PathBuf::from(name)
    }

    /// Convert a snapshot into this format's bytes.
    pub fn encode(self, snapshot: &Snapshot) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Bytes => codec::encode_binary(snapshot),
            Self::BytesZ => codec::compress(&codec::encode_binary(snapshot)?),
            Self::Json => codec::compress(&codec::encode_json(snapshot)?),
        }
    }

    /// Convert this format's bytes back into a snapshot.
    pub fn decode(self, bytes: &[u8]) -> Result<Snapshot, CodecError> {
        match self {
            Self::Bytes => codec::decode_binary(bytes),
            Self::BytesZ => codec::decode_binary(&codec::decompress(bytes)?),
            Self::Json => codec::decode_json(&codec::decompress(bytes)?),
        }
    }

    /// Snapshot `store`, encode it and write it to `path`, returning the size
    /// of the written file. Existing files are truncated.
    pub fn save(self, store: &ItemStore, path: &Path) -> Result<u64, StorageError> {
        let snapshot = store.snapshot();
        let bytes = self
            .encode(&snapshot)
            .map_err(|source| StorageError::Encode {
                path: path.to_path_buf(),
                format: self,
                source,
            })?;
        let size = write_file(path, &bytes)?;
        info!(
            "Saved {} items as {self} to {} ({size} bytes)",
            snapshot.len(),
            path.display()
        );
        Ok(size)
    }

    /// Read `path`, decode it and restore `store` from it, returning the
    /// number of items now held.
    ///
    /// `store` is left untouched unless decoding and validation succeed.
    pub fn load(self, store: &mut ItemStore, path: &Path) -> Result<usize, StorageError> {
        let bytes = fs::read(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = self
            .decode(&bytes)
            .map_err(|source| StorageError::Decode {
                path: path.to_path_buf(),
                format: self,
                source,
            })?;
        snapshot
            .validate()
            .map_err(|source| StorageError::Inconsistent {
                path: path.to_path_buf(),
                source,
            })?;
        store.restore(snapshot);
        Ok(store.len())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<u64, StorageError> {
    let write_error = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(write_error)?;
    file.write_all(bytes).map_err(write_error)?;
    file.sync_all().map_err(write_error)?;
    file.metadata().map(|meta| meta.len()).map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{populate, sample_inputs};
    use crate::{ItemIn, Label};
    use rstest::{fixture, rstest};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("create temp dir")
    }

    #[fixture]
    fn store() -> ItemStore {
        let mut store = ItemStore::new();
        populate(&mut store, sample_inputs());
        store
    }

    #[rstest]
    #[case(StorageFormat::Bytes)]
    #[case(StorageFormat::BytesZ)]
    #[case(StorageFormat::Json)]
    fn save_then_load_reproduces_store(
        temp_dir: TempDir,
        store: ItemStore,
        #[case] format: StorageFormat,
    ) {
        let path = format.file_name(&temp_dir.path().join("items"));
        let size = format.save(&store, &path).expect("save store");
        assert_eq!(size, fs::metadata(&path).expect("stat saved file").len());

        let mut restored = ItemStore::new();
        let loaded = format.load(&mut restored, &path).expect("load store");

        assert_eq!(loaded, store.len());
        assert_eq!(restored.snapshot(), store.snapshot());
        for label in (0..store.len()).map(Label::new) {
            assert_eq!(restored.item_out(label), store.item_out(label));
            assert!(restored.geo().contains_label(label));
        }
    }

    #[rstest]
    #[case(StorageFormat::Bytes)]
    #[case(StorageFormat::BytesZ)]
    #[case(StorageFormat::Json)]
    fn groupings_survive_a_save_cycle(
        temp_dir: TempDir,
        store: ItemStore,
        #[case] format: StorageFormat,
    ) {
        let path = format.file_name(&temp_dir.path().join("items"));
        format.save(&store, &path).expect("save store");
        let mut restored = ItemStore::new();
        format.load(&mut restored, &path).expect("load store");

        let labels = |store: &ItemStore| {
            let mut groups: Vec<(String, Vec<Label>)> = store
                .group_by("kind")
                .into_iter()
                .map(|(key, items)| (key, items.iter().map(|item| item.label()).collect()))
                .collect();
            groups.sort();
            groups
        };
        assert_eq!(labels(&restored), labels(&store));
    }

    #[rstest]
    fn compressed_file_inflates_to_plain_bytes(temp_dir: TempDir, store: ItemStore) {
        let plain = StorageFormat::Bytes.file_name(&temp_dir.path().join("items"));
        let packed = StorageFormat::BytesZ.file_name(&temp_dir.path().join("items"));
        StorageFormat::Bytes.save(&store, &plain).expect("save bytes");
        StorageFormat::BytesZ.save(&store, &packed).expect("save bytesz");

        let plain_bytes = fs::read(&plain).expect("read bytes");
        let packed_bytes = fs::read(&packed).expect("read bytesz");
        assert_eq!(
            codec::decompress(&packed_bytes).expect("inflate"),
            plain_bytes
        );
    }

    #[rstest]
    fn load_replaces_existing_items(temp_dir: TempDir, store: ItemStore) {
        let path = temp_dir.path().join("items.bytes");
        let mut single = ItemStore::new();
        populate(&mut single, sample_inputs().into_iter().take(1));
        StorageFormat::Bytes
            .save(&single, &path)
            .expect("save single item");

        let mut target = store;
        let loaded = StorageFormat::Bytes
            .load(&mut target, &path)
            .expect("load single item");

        assert_eq!(loaded, 1);
        assert_eq!(target.len(), 1);
        assert!(target.labels_where("kind", "park").is_empty());
    }

    #[rstest]
    fn load_reports_missing_file(temp_dir: TempDir) {
        let mut store = ItemStore::new();
        let error = StorageFormat::Bytes
            .load(&mut store, &temp_dir.path().join("absent.bytes"))
            .expect_err("missing file should fail");
        assert!(matches!(error, StorageError::Read { .. }));
    }

    #[rstest]
    #[case(StorageFormat::Bytes)]
    #[case(StorageFormat::BytesZ)]
    #[case(StorageFormat::Json)]
    fn load_rejects_corrupt_file_and_keeps_store(
        temp_dir: TempDir,
        store: ItemStore,
        #[case] format: StorageFormat,
    ) {
        let path = format.file_name(&temp_dir.path().join("corrupt"));
        fs::write(&path, b"\x07garbage").expect("write corrupt file");

        let mut target = store;
        let error = format
            .load(&mut target, &path)
            .expect_err("corrupt file should fail");
        assert!(matches!(error, StorageError::Decode { format: f, .. } if f == format));
        assert_eq!(target.len(), 3);
    }

    #[rstest]
    fn load_rejects_misplaced_labels(temp_dir: TempDir, store: ItemStore) {
        let mut snapshot = store.snapshot();
        snapshot.items.swap(0, 2);
        let path = temp_dir.path().join("shuffled.bytes");
        let bytes = StorageFormat::Bytes.encode(&snapshot).expect("encode");
        fs::write(&path, bytes).expect("write shuffled snapshot");

        let mut target = ItemStore::new();
        let error = StorageFormat::Bytes
            .load(&mut target, &path)
            .expect_err("misplaced labels should fail");
        assert!(matches!(error, StorageError::Inconsistent { .. }));
        assert!(target.is_empty());
    }

    #[rstest]
    fn save_reports_unwritable_path(store: ItemStore) {
        let error = StorageFormat::Bytes
            .save(&store, Path::new("/non-existent/dir/items.bytes"))
            .expect_err("missing directory should fail");
        assert!(matches!(error, StorageError::Write { .. }));
    }

    #[rstest]
    fn empty_store_round_trips(temp_dir: TempDir) {
        let path = temp_dir.path().join("empty.json");
        let empty = ItemStore::new();
        StorageFormat::Json.save(&empty, &path).expect("save empty");
        let mut restored = ItemStore::new();
        populate(&mut restored, [ItemIn::default()]);
        assert_eq!(
            StorageFormat::Json.load(&mut restored, &path).expect("load"),
            0
        );
        assert!(restored.geo().is_empty());
        assert!(restored.columns().is_empty());
    }

    #[rstest]
    fn save_does_not_disturb_shared_items(temp_dir: TempDir, store: ItemStore) {
        let before: Vec<_> = store.items().iter().map(Arc::as_ptr).collect();
        StorageFormat::BytesZ
            .save(&store, &temp_dir.path().join("items.bytesz"))
            .expect("save store");
        let after: Vec<_> = store.items().iter().map(Arc::as_ptr).collect();
        assert_eq!(before, after);
    }

    #[rstest]
    #[case("bytes", Ok(StorageFormat::Bytes))]
    #[case("bytesz", Ok(StorageFormat::BytesZ))]
    #[case("json", Ok(StorageFormat::Json))]
    #[case("BYTES", Err(UnknownStorageFormat(String::from("BYTES"))))]
    #[case("", Err(UnknownStorageFormat(String::new())))]
    fn parses_format_names(
        #[case] name: &str,
        #[case] expected: Result<StorageFormat, UnknownStorageFormat>,
    ) {
        assert_eq!(name.parse::<StorageFormat>(), expected);
    }

    #[rstest]
    #[case("json", StorageFormat::Json)]
    #[case("gob", StorageFormat::Bytes)]
    fn resolve_falls_back_to_bytes(#[case] name: &str, #[case] expected: StorageFormat) {
        assert_eq!(StorageFormat::resolve(name), expected);
    }

    #[rstest]
    fn file_name_appends_format_to_base() {
        assert_eq!(
            StorageFormat::Json.file_name(Path::new("data/items")),
            PathBuf::from("data/items.json")
        );
        assert_eq!(
            StorageFormat::BytesZ.file_name(Path::new("items.v2")),
            PathBuf::from("items.v2.bytesz")
        );
    }
}
