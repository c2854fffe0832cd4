//! Addressing layout of a dataset, detached from its records.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Key;

/// Which of the two addressing schemes a dataset or an index set uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Layout {
    /// A single contiguous range `0..n`.
    Flat,
    /// Named sub-collections, each addressed locally.
    Keyed,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Flat => write!(f, "flat"),
            Layout::Keyed => write!(f, "keyed"),
        }
    }
}

/// The shape of a dataset: its length if flat, or its ordered `key → length` list.
///
/// The order of a keyed shape is the canonical flattening order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Shape {
    Flat(usize),
    Keyed(Vec<(Key, usize)>),
}

impl Shape {
    pub fn layout(&self) -> Layout {
        match self {
            Shape::Flat(_) => Layout::Flat,
            Shape::Keyed(_) => Layout::Keyed,
        }
    }

    /// Total number of addressable records.
    pub fn total_len(&self) -> usize {
        match self {
            Shape::Flat(len) => *len,
            Shape::Keyed(entries) => entries.iter().map(|(_, len)| len).sum(),
        }
    }

    /// Length of one key's sub-collection. Always `None` for a flat shape.
    pub fn len_of(&self, key: &str) -> Option<usize> {
        match self {
            Shape::Flat(_) => None,
            Shape::Keyed(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, len)| *len),
        }
    }

    /// Keys in canonical order. Empty for a flat shape.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let entries: &[(Key, usize)] = match self {
            Shape::Flat(_) => &[],
            Shape::Keyed(entries) => entries,
        };
        entries.iter().map(|(k, _)| k.as_str())
    }
}
