//! UTF-8 path helpers for the files the item store reads and writes,
//! built on `cap-std` and `camino`.
//!
//! Store files and ingestion inputs are addressed by plain paths on the
//! command line. These helpers turn such a path into a capability-scoped
//! directory handle plus a relative remainder before touching the disk.
#![forbid(unsafe_code)]

use std::io;
use std::path::MAIN_SEPARATOR_STR;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Open an ingestion input file for reading.
pub fn open_input(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Whether `path` names an existing regular file. Missing files and
/// directories both report `false`.
pub fn regular_file_exists(path: &Utf8Path) -> io::Result<bool> {
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new(""));
    let Some(name) = path.file_name() else {
        return Ok(false);
    };
    let (dir, relative) = anchor(parent)?;
    let target = relative.join(name);
    match dir.metadata(&target) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Create every missing directory above the store file at `path`.
pub fn prepare_store_path(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    let (dir, relative) = anchor(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    dir.create_dir_all(&relative)
}

/// Split `path` into an ambient directory for its root and the path below
/// it. Relative paths are anchored at the current directory.
fn anchor(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let mut components = path.components();
    let base = match components.clone().next() {
        Some(Utf8Component::Prefix(prefix)) => {
            components.next();
            if components.clone().next() == Some(Utf8Component::RootDir) {
                components.next();
            }
            Utf8PathBuf::from(format!("{}{MAIN_SEPARATOR_STR}", prefix.as_str()))
        }
        Some(Utf8Component::RootDir) => {
            components.next();
            Utf8PathBuf::from(MAIN_SEPARATOR_STR)
        }
        _ => Utf8PathBuf::from("."),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    Ok((dir, components.as_path().to_path_buf()))
}
