//! Indexes derived from the stored items.
//!
//! Both indexes are keyed by [`Label`](crate::Label) and can be rebuilt at
//! any time from the collection, which is what restore does after replacing
//! it.

mod columns;
mod spatial;

pub use columns::{Bitset, ColumnIndex};
pub use spatial::{GeoEntry, GeoIndex};
