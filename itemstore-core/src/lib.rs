//! Core domain types for the item store.
//!
//! The crate owns the compact stored form of an item, the interning model
//! maps, the bit-array column and geo indexes built from stored items, and the
//! [`ItemStore`] that ties them together. Persistence lives in [`storage`]:
//! a closed set of [`StorageFormat`]s that snapshot, encode and restore the
//! whole store.
//!
//! Invariants:
//! - An item's [`Label`] equals its slot in the collection.
//! - The collection only grows during ingestion and is replaced wholesale on
//!   restore.
//! - No global mutable state; callers own the [`ItemStore`].

#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod index;
pub mod item;
pub mod maps;
pub mod storage;
mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use bootstrap::{BootstrapError, BootstrapReport, load_at_start};
pub use index::{Bitset, ColumnIndex, GeoEntry, GeoIndex};
pub use item::{FieldValue, Item, ItemIn, ItemOut, Items, ItemsGroupedBy, ItemsIn, Label};
pub use maps::{ColumnId, ModelMaps, ValueId};
pub use storage::{CodecError, StorageError, StorageFormat, UnknownStorageFormat};
pub use store::{ItemStore, MisplacedItem, Snapshot};
