//! Bit-array columns: one bitset of labels per interned `(column, value)`.

use std::collections::HashMap;

use crate::item::{FieldValue, Label};
use crate::maps::{ColumnId, ValueId};

const WORD_BITS: usize = u64::BITS as usize;
const WORD_SHIFT: u32 = WORD_BITS.trailing_zeros();

/// Growable set of labels packed into 64-bit words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitset {
    words: Vec<u64>,
}

impl Bitset {
    /// Mark `label` as present.
    pub fn insert(&mut self, label: Label) {
        let (word, bit) = position(label);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        if let Some(slot) = self.words.get_mut(word) {
            *slot |= 1_u64 << bit;
        }
    }

    /// Whether `label` is present.
    #[must_use]
    pub fn contains(&self, label: Label) -> bool {
        let (word, bit) = position(label);
        self.words
            .get(word)
            .is_some_and(|slot| slot & (1_u64 << bit) != 0)
    }

    /// Number of labels present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    /// Whether no label is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// Present labels in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Label> + '_ {
        self.words.iter().enumerate().flat_map(|(index, &bits)| {
            (0..WORD_BITS)
                .filter(move |bit| bits & (1_u64 << bit) != 0)
                .map(move |bit| Label::new(index * WORD_BITS + bit))
        })
    }
}

fn position(label: Label) -> (usize, usize) {
    let index = label.index();
    (index >> WORD_SHIFT, index & (WORD_BITS - 1))
}

/// Bitsets of labels keyed by interned field value.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    bitsets: HashMap<FieldValue, Bitset>,
}

impl ColumnIndex {
    /// Record that the item with `label` carries `value` in `column`.
    pub fn insert(&mut self, column: ColumnId, value: ValueId, label: Label) {
        self.bitsets
            .entry(FieldValue { column, value })
            .or_default()
            .insert(label);
    }

    /// Labels of items carrying `value` in `column`.
    #[must_use]
    pub fn labels(&self, column: ColumnId, value: ValueId) -> Option<&Bitset> {
        self.bitsets.get(&FieldValue { column, value })
    }

    /// Number of distinct `(column, value)` bitsets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bitsets.len()
    }

    /// Whether the index holds no bitsets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bitsets.is_empty()
    }

    /// Drop every bitset.
    pub fn clear(&mut self) {
        self.bitsets.clear();
    }
}
