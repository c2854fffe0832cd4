//! Datasets: either one flat list of records or named sub-collections.
//!
//! A [`Dataset`] is a tagged union over exactly two addressing schemes.
//! Every operation in this crate matches on the tag and fails on a mismatch
//! instead of inferring intent from the data.

mod keyed;
mod shape;

pub use keyed::KeyedData;
pub use shape::{Layout, Shape};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name of one sub-collection of a keyed dataset.
pub type Key = String;

/// A flat or keyed collection of records.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[cfg_attr(feature = "serde", serde(bound(serialize = "R: Clone + Serialize")))]
#[cfg_attr(feature = "serde", serde(bound(deserialize = "R: Deserialize<'de>")))]
pub enum Dataset<R> {
    Flat(Vec<R>),
    Keyed(KeyedData<R>),
}

impl<R> Dataset<R> {
    pub fn layout(&self) -> Layout {
        match self {
            Dataset::Flat(_) => Layout::Flat,
            Dataset::Keyed(_) => Layout::Keyed,
        }
    }

    /// Snapshot of the addressing shape, independent of the records.
    pub fn shape(&self) -> Shape {
        match self {
            Dataset::Flat(records) => Shape::Flat(records.len()),
            Dataset::Keyed(data) => Shape::Keyed(
                data.iter()
                    .map(|(key, records)| (key.clone(), records.len()))
                    .collect(),
            ),
        }
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        match self {
            Dataset::Flat(records) => records.len(),
            Dataset::Keyed(data) => data.total_len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records in canonical order: key by key, in insertion order.
    pub fn flatten(&self) -> Vec<&R> {
        match self {
            Dataset::Flat(records) => records.iter().collect(),
            Dataset::Keyed(data) => data
                .iter()
                .flat_map(|(_, records)| records.iter())
                .collect(),
        }
    }
}

impl<R> From<Vec<R>> for Dataset<R> {
    fn from(records: Vec<R>) -> Self {
        Dataset::Flat(records)
    }
}

impl<R> From<KeyedData<R>> for Dataset<R> {
    fn from(data: KeyedData<R>) -> Self {
        Dataset::Keyed(data)
    }
}
