//! Interning maps shared by every stored item.
//!
//! Column names and their values are registered in first-seen order and
//! referred to by position afterwards. Only the ordered name and value lists
//! are persisted; the reverse lookup tables are rebuilt by
//! [`ModelMaps::load`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::item::FieldValue;

/// Position of a column in [`ModelMaps`].
pub type ColumnId = usize;

/// Position of a value within one column of [`ModelMaps`].
pub type ValueId = usize;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ColumnMap {
    name: String,
    values: Vec<String>,
    #[serde(skip)]
    value_ids: HashMap<String, ValueId>,
}

impl ColumnMap {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    fn intern(&mut self, value: &str) -> ValueId {
        if let Some(id) = self.value_ids.get(value) {
            return *id;
        }
        let id = self.values.len();
        self.values.push(value.to_owned());
        self.value_ids.insert(value.to_owned(), id);
        id
    }

    fn reindex(&mut self) {
        self.value_ids = self
            .values
            .iter()
            .enumerate()
            .map(|(id, value)| (value.clone(), id))
            .collect();
    }
}

/// Secondary interning maps owned by the store.
///
/// # Examples
/// ```
/// use itemstore_core::ModelMaps;
///
/// let mut maps = ModelMaps::default();
/// let field = maps.intern("kind", "cafe");
/// assert_eq!(maps.column_name(field.column), Some("kind"));
/// assert_eq!(maps.value(field.column, field.value), Some("cafe"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelMaps {
    columns: Vec<ColumnMap>,
    #[serde(skip)]
    column_ids: HashMap<String, ColumnId>,
}

impl ModelMaps {
    /// Register `name` as a column, returning its id.
    pub fn intern_column(&mut self, name: &str) -> ColumnId {
        if let Some(id) = self.column_ids.get(name) {
            return *id;
        }
        let id = self.columns.len();
        self.columns.push(ColumnMap::new(name));
        self.column_ids.insert(name.to_owned(), id);
        id
    }

    /// Register `value` under `column`, returning the interned pair.
    pub fn intern(&mut self, column: &str, value: &str) -> FieldValue {
        let column_id = self.intern_column(column);
        let value_id = self
            .columns
            .get_mut(column_id)
            .map_or(0, |map| map.intern(value));
        FieldValue {
            column: column_id,
            value: value_id,
        }
    }

    /// Id of a registered column.
    #[must_use]
    pub fn column_id(&self, name: &str) -> Option<ColumnId> {
        self.column_ids.get(name).copied()
    }

    /// Id of a registered value within a registered column.
    #[must_use]
    pub fn value_id(&self, column: &str, value: &str) -> Option<FieldValue> {
        let column_id = self.column_id(column)?;
        let value_id = self.columns.get(column_id)?.value_ids.get(value).copied()?;
        Some(FieldValue {
            column: column_id,
            value: value_id,
        })
    }

    /// Name of the column with `id`.
    #[must_use]
    pub fn column_name(&self, id: ColumnId) -> Option<&str> {
        self.columns.get(id).map(|map| map.name.as_str())
    }

    /// Value string for `value` within `column`.
    #[must_use]
    pub fn value(&self, column: ColumnId, value: ValueId) -> Option<&str> {
        self.columns
            .get(column)?
            .values
            .get(value)
            .map(String::as_str)
    }

    /// All values registered for `column`, in id order.
    #[must_use]
    pub fn values_in(&self, column: ColumnId) -> Option<&[String]> {
        self.columns.get(column).map(|map| map.values.as_slice())
    }

    /// Number of registered columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Capture the current maps for a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Adopt persisted maps, rebuilding the lookup tables that are not
    /// serialised.
    #[must_use]
    pub fn load(mut maps: Self) -> Self {
        for column in &mut maps.columns {
            column.reindex();
        }
        maps.column_ids = maps
            .columns
            .iter()
            .enumerate()
            .map(|(id, column)| (column.name.clone(), id))
            .collect();
        maps
    }
}

// Lookup tables are derived state and do not take part in equality.
impl PartialEq for ModelMaps {
    fn eq(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(lhs, rhs)| lhs.name == rhs.name && lhs.values == rhs.values)
    }
}
