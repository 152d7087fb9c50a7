//! R\*-tree over the locations of stored items.

use std::fmt;

use geo::{Coord, Rect};
use rstar::{AABB, RTree, RTreeObject};

use super::Bitset;
use crate::item::Label;

/// Entry stored inside the geo index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoEntry {
    /// Label of the indexed item.
    pub label: Label,
    /// Position in WGS84 (`x = longitude`, `y = latitude`).
    pub location: Coord<f64>,
}

impl RTreeObject for GeoEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.x, self.location.y])
    }
}

/// Spatial index of located items keyed by label.
#[derive(Default)]
pub struct GeoIndex {
    tree: RTree<GeoEntry>,
    indexed: Bitset,
}

impl fmt::Debug for GeoIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeoIndex")
            .field("entries", &self.tree.size())
            .finish_non_exhaustive()
    }
}

impl GeoIndex {
    /// Build an index from a full set of entries in one pass.
    #[must_use]
    pub fn bulk_load(entries: Vec<GeoEntry>) -> Self {
        let mut indexed = Bitset::default();
        for entry in &entries {
            indexed.insert(entry.label);
        }
        Self {
            tree: RTree::bulk_load(entries),
            indexed,
        }
    }

    /// Index `label` at `location`.
    pub fn insert(&mut self, label: Label, location: Coord<f64>) {
        self.tree.insert(GeoEntry { label, location });
        self.indexed.insert(label);
    }

    /// Whether an entry exists for `label`.
    #[must_use]
    pub fn contains_label(&self, label: Label) -> bool {
        self.indexed.contains(label)
    }

    /// Labels whose location falls inside `bbox`, boundary included, in
    /// ascending order.
    #[must_use]
    pub fn labels_in_bbox(&self, bbox: &Rect<f64>) -> Vec<Label> {
        let envelope =
            AABB::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y]);
        let mut labels: Vec<_> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.label)
            .collect();
        labels.sort_unstable();
        labels
    }

    /// Number of indexed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn entry(label: usize, x: f64, y: f64) -> GeoEntry {
        GeoEntry {
            label: Label::new(label),
            location: Coord { x, y },
        }
    }

    fn bbox(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Rect<f64> {
        Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y })
    }

    #[fixture]
    fn index() -> GeoIndex {
        GeoIndex::bulk_load(vec![entry(0, 0.0, 0.0), entry(2, 5.0, 1.0)])
    }

    #[rstest]
    fn bulk_load_marks_labels(index: GeoIndex) {
        assert_eq!(index.len(), 2);
        assert!(index.contains_label(Label::new(0)));
        assert!(!index.contains_label(Label::new(1)));
        assert!(index.contains_label(Label::new(2)));
    }

    #[rstest]
    #[case(bbox(-0.5, -0.5, 0.5, 0.5), vec![0])]
    #[case(bbox(-1.0, -1.0, 6.0, 2.0), vec![0, 2])]
    #[case(bbox(5.0, 1.0, 6.0, 2.0), vec![2])]
    #[case(bbox(10.0, 10.0, 11.0, 11.0), vec![])]
    fn bbox_queries_return_sorted_labels(
        index: GeoIndex,
        #[case] query: Rect<f64>,
        #[case] expected: Vec<usize>,
    ) {
        let found: Vec<_> = index
            .labels_in_bbox(&query)
            .into_iter()
            .map(Label::index)
            .collect();
        assert_eq!(found, expected);
    }

    #[rstest]
    fn insert_extends_index(mut index: GeoIndex) {
        index.insert(Label::new(3), Coord { x: 0.1, y: 0.1 });
        assert!(index.contains_label(Label::new(3)));
        assert_eq!(index.labels_in_bbox(&bbox(-0.5, -0.5, 0.5, 0.5)).len(), 2);
    }

    #[rstest]
    fn default_index_is_empty() {
        let index = GeoIndex::default();
        assert!(index.is_empty());
        assert!(!index.contains_label(Label::ZERO));
    }
}
