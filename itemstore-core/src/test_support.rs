//! Sample records and a minimal in-order loader shared by unit and
//! behaviour tests.

use std::sync::Arc;

use geo::Coord;

use crate::{ItemIn, ItemStore, ItemsIn, Label};

/// Three located records: two cafes around a park.
#[must_use]
pub fn sample_inputs() -> Vec<ItemIn> {
    vec![
        ItemIn::new(
            [("name", "Brew"), ("kind", "cafe")],
            Some(Coord { x: 4.90, y: 52.37 }),
        ),
        ItemIn::new(
            [("name", "Vondelpark"), ("kind", "park")],
            Some(Coord { x: 4.87, y: 52.36 }),
        ),
        ItemIn::new(
            [("name", "Grind"), ("kind", "cafe")],
            Some(Coord { x: 4.91, y: 52.38 }),
        ),
    ]
}

/// A batch of three slots whose middle entry is missing.
#[must_use]
pub fn batch_with_gap() -> ItemsIn {
    let mut inputs = sample_inputs().into_iter();
    let first = inputs.next();
    let _skipped = inputs.next();
    let third = inputs.next();
    vec![first, None, third]
}

/// Append `inputs` to `store` in order, labelling from the current length.
///
/// This mirrors the ingestion sequence without its slot check and exists so
/// core tests need not depend on the worker.
pub fn populate<I>(store: &mut ItemStore, inputs: I)
where
    I: IntoIterator<Item = ItemIn>,
{
    for input in inputs {
        let label = Label::new(store.len());
        let shrunk = store.shrink(&input, label);
        store.build_columns(&shrunk);
        let item = Arc::new(shrunk);
        store.append(Arc::clone(&item));
        store.build_geo_index_entry(&item);
    }
}
