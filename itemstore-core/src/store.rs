//! The item store and its serialisable snapshot.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::index::{ColumnIndex, GeoEntry, GeoIndex};
use crate::item::{Item, ItemIn, ItemOut, Items, ItemsGroupedBy, Label};
use crate::maps::ModelMaps;

/// The unit handed to every codec: the collection plus the model maps.
///
/// Built by [`ItemStore::snapshot`] from shallow `Arc` clones, so taking one
/// never copies item contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Stored items in label order.
    pub items: Items,
    /// Interning maps the items were shrunk with.
    pub maps: ModelMaps,
}

/// A decoded snapshot whose collection breaks the label/slot invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("item labelled {label} is stored at slot {slot}")]
pub struct MisplacedItem {
    /// Slot the item occupies.
    pub slot: usize,
    /// Label the item carries.
    pub label: Label,
}

impl Snapshot {
    /// Number of items in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the snapshot holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check that every item sits at the slot named by its label.
    pub fn validate(&self) -> Result<(), MisplacedItem> {
        self.items
            .iter()
            .enumerate()
            .find(|(slot, item)| item.label().index() != *slot)
            .map_or(Ok(()), |(slot, item)| {
                Err(MisplacedItem {
                    slot,
                    label: item.label(),
                })
            })
    }
}

/// Owner of the item collection, the model maps and the derived indexes.
///
/// There is no internal locking. Exactly one writer may mutate a store at a
/// time; the ingestion worker enforces this by taking the store by value.
#[derive(Default)]
pub struct ItemStore {
    items: Items,
    maps: ModelMaps,
    columns: ColumnIndex,
    geo: GeoIndex,
}

impl fmt::Debug for ItemStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemStore")
            .field("items", &self.items.len())
            .field("columns", &self.maps.column_count())
            .field("geo_entries", &self.geo.len())
            .finish_non_exhaustive()
    }
}

impl ItemStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stored items in label order.
    #[must_use]
    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }

    /// Item stored under `label`.
    #[must_use]
    pub fn get(&self, label: Label) -> Option<&Arc<Item>> {
        self.items.get(label.index())
    }

    /// Interning maps.
    #[must_use]
    pub const fn maps(&self) -> &ModelMaps {
        &self.maps
    }

    /// Bit-array column index.
    #[must_use]
    pub const fn columns(&self) -> &ColumnIndex {
        &self.columns
    }

    /// Geo index.
    #[must_use]
    pub const fn geo(&self) -> &GeoIndex {
        &self.geo
    }

    /// Read-facing projection of the item stored under `label`.
    #[must_use]
    pub fn item_out(&self, label: Label) -> Option<ItemOut> {
        self.get(label)
            .map(|item| ItemOut::expand(item, &self.maps))
    }

    /// Labels of items whose `column` holds `value`, via the column index.
    #[must_use]
    pub fn labels_where(&self, column: &str, value: &str) -> Vec<Label> {
        self.maps
            .value_id(column, value)
            .and_then(|field| self.columns.labels(field.column, field.value))
            .map(|bitset| bitset.iter().collect())
            .unwrap_or_default()
    }

    /// Group items by their value in `column`. Items without the column are
    /// left out.
    #[must_use]
    pub fn group_by(&self, column: &str) -> ItemsGroupedBy {
        let mut groups = ItemsGroupedBy::new();
        let Some(column_id) = self.maps.column_id(column) else {
            return groups;
        };
        for item in &self.items {
            let Some(value) = item
                .value_of(column_id)
                .and_then(|value| self.maps.value(column_id, value))
            else {
                continue;
            };
            groups
                .entry(value.to_owned())
                .or_default()
                .push(Arc::clone(item));
        }
        groups
    }

    /// Shrink `input` into its stored form under `label`, interning its
    /// fields into the store's maps.
    pub fn shrink(&mut self, input: &ItemIn, label: Label) -> Item {
        input.shrink(label, &mut self.maps)
    }

    /// Add `item` to the bit-array column index.
    pub fn build_columns(&mut self, item: &Item) {
        item.build_columns(&mut self.columns);
    }

    /// Append `item` to the end of the collection.
    pub fn append(&mut self, item: Arc<Item>) {
        self.items.push(item);
    }

    /// Add `item` to the geo index.
    pub fn build_geo_index_entry(&mut self, item: &Item) {
        item.build_geo_index_entry(&mut self.geo);
    }

    /// Capture the current collection and maps.
    ///
    /// Callers must not take a snapshot while another writer is appending;
    /// the borrow checker enforces this for owned stores.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            items: self.items.clone(),
            maps: self.maps.snapshot(),
        }
    }

    /// Replace the collection and maps wholesale with `snapshot`, then
    /// rebuild every index over the new collection.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.items = snapshot.items;
        self.maps = ModelMaps::load(snapshot.maps);
        self.rebuild_indexes();
    }

    /// Recompute the column and geo indexes from the collection.
    pub fn rebuild_indexes(&mut self) {
        self.columns.clear();
        for item in &self.items {
            item.build_columns(&mut self.columns);
        }
        let entries = self
            .items
            .iter()
            .filter_map(|item| {
                item.location().map(|location| GeoEntry {
                    label: item.label(),
                    location,
                })
            })
            .collect();
        self.geo = GeoIndex::bulk_load(entries);
    }
}
