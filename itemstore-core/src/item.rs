//! Input, stored and output forms of an item.
//!
//! Producers hand the store [`ItemIn`] records. Ingestion shrinks each one
//! into an [`Item`], whose field values are interned through [`ModelMaps`]
//! and whose [`Label`] doubles as its slot in the collection. [`ItemOut`] is
//! the read-facing projection with the interned ids expanded again.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::index::{ColumnIndex, GeoIndex};
use crate::maps::{ColumnId, ModelMaps, ValueId};

/// Sequential identity of a stored item.
///
/// Labels are handed out by the ingestion worker starting at zero. The item
/// carrying label `n` always sits at index `n` of the collection.
///
/// # Examples
/// ```
/// use itemstore_core::Label;
///
/// let first = Label::ZERO;
/// assert_eq!(first.next(), Label::new(1));
/// assert_eq!(Label::new(3).index(), 3);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Label(usize);

impl Label {
    /// The first label assigned by a fresh worker.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw slot index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Slot index in the collection.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// The label following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<usize> for Label {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Raw input record produced outside the store.
///
/// Fields are free-form column/value pairs. The optional location uses WGS84
/// with `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use itemstore_core::ItemIn;
///
/// let input: ItemIn = serde_json::from_str(
///     r#"{"fields":{"kind":"cafe"},"location":{"x":4.9,"y":52.37}}"#,
/// )?;
/// assert_eq!(input.fields.get("kind").map(String::as_str), Some("cafe"));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemIn {
    /// Column name to value.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Geospatial position, if the record has one.
    #[serde(default)]
    pub location: Option<Coord<f64>>,
}

impl ItemIn {
    /// Construct an input record from fields and an optional location.
    pub fn new<I, K, V>(fields: I, location: Option<Coord<f64>>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            location,
        }
    }

    /// Shrink the record into its compact stored form under `label`.
    ///
    /// Unseen columns and values are registered in `maps` in first-seen
    /// order; the stored pairs are sorted by column id.
    pub fn shrink(&self, label: Label, maps: &mut ModelMaps) -> Item {
        let mut values: Vec<FieldValue> = self
            .fields
            .iter()
            .map(|(column, value)| maps.intern(column, value))
            .collect();
        values.sort_unstable();
        Item {
            label,
            values,
            location: self.location,
        }
    }
}

/// A batch of input records. `None` entries are skipped by ingestion.
pub type ItemsIn = Vec<Option<ItemIn>>;

/// One interned `(column, value)` pair of a stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldValue {
    /// Interned column name.
    pub column: ColumnId,
    /// Interned value within the column.
    pub value: ValueId,
}

/// Compact stored form of an ingested record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    label: Label,
    values: Vec<FieldValue>,
    location: Option<Coord<f64>>,
}

impl Item {
    /// Label assigned at ingestion.
    #[must_use]
    pub const fn label(&self) -> Label {
        self.label
    }

    /// Interned field values, sorted by column id.
    #[must_use]
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Geospatial position, if any.
    #[must_use]
    pub const fn location(&self) -> Option<Coord<f64>> {
        self.location
    }

    /// Interned value stored for `column`, if the item has one.
    #[must_use]
    pub fn value_of(&self, column: ColumnId) -> Option<ValueId> {
        self.values
            .binary_search_by_key(&column, |field| field.column)
            .ok()
            .and_then(|position| self.values.get(position))
            .map(|field| field.value)
    }

    /// Set this item's bit in every column bitset it participates in.
    pub fn build_columns(&self, columns: &mut ColumnIndex) {
        for field in &self.values {
            columns.insert(field.column, field.value, self.label);
        }
    }

    /// Insert this item into the geo index under its label.
    ///
    /// Items without a location are not indexed.
    pub fn build_geo_index_entry(&self, geo: &mut GeoIndex) {
        if let Some(location) = self.location {
            geo.insert(self.label, location);
        }
    }
}

/// The shared collection: stored items in label order.
pub type Items = Vec<Arc<Item>>;

/// Items grouped by the value of one column.
pub type ItemsGroupedBy = HashMap<String, Items>;

/// Read-facing projection of a stored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOut {
    /// Label of the projected item.
    pub label: Label,
    /// Column name to value, expanded from the model maps.
    pub fields: BTreeMap<String, String>,
    /// Geospatial position, if any.
    pub location: Option<Coord<f64>>,
}

impl ItemOut {
    /// Expand a stored item through the maps it was interned with.
    ///
    /// Pairs whose ids are unknown to `maps` are left out.
    #[must_use]
    pub fn expand(item: &Item, maps: &ModelMaps) -> Self {
        let fields = item
            .values
            .iter()
            .filter_map(|field| {
                let column = maps.column_name(field.column)?;
                let value = maps.value(field.column, field.value)?;
                Some((column.to_owned(), value.to_owned()))
            })
            .collect();
        Self {
            label: item.label,
            fields,
            location: item.location,
        }
    }
}
