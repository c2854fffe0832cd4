//! Conversion between flat indices and `(key, local index)` pairs.
//!
//! A keyed shape `[(k₁, n₁), (k₂, n₂), …]` is laid out end to end: `k₁`
//! occupies `[0, n₁)`, `k₂` occupies `[n₁, n₁ + n₂)` and so on. [`IndexSpace`]
//! holds the prefix sums of that layout and translates in both directions.
//!
//! # Out-of-range flat indices
//!
//! [`IndexSpace::to_keyed`] drops flat indices at or beyond the total length
//! without reporting them. This lets a selection computed against an older,
//! smaller dataset be re-keyed onto the current one. Every other conversion
//! validates its input.

use std::collections::BTreeMap;

use crate::dataset::{Key, Layout, Shape};
use crate::error::SelectionError;

/// Per-key index lists, each sorted ascending and local to its key.
pub type KeyedIds = BTreeMap<Key, Vec<usize>>;

/// A sorted, deduplicated index set in either addressing scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Indices {
    Flat(Vec<usize>),
    Keyed(KeyedIds),
}

impl Indices {
    /// An empty set in the given layout.
    pub fn empty(layout: Layout) -> Self {
        match layout {
            Layout::Flat => Indices::Flat(Vec::new()),
            Layout::Keyed => Indices::Keyed(KeyedIds::new()),
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            Indices::Flat(_) => Layout::Flat,
            Indices::Keyed(_) => Layout::Keyed,
        }
    }

    /// Number of indices across all keys.
    pub fn len(&self) -> usize {
        match self {
            Indices::Flat(ids) => ids.len(),
            Indices::Keyed(per_key) => per_key.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    key: Key,
    offset: usize,
    len: usize,
}

/// Cumulative offsets of a keyed shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpace {
    segments: Vec<Segment>,
    total: usize,
}

// ─────────────────────────────────────────────────────────────────────
// Constructors
// ─────────────────────────────────────────────────────────────────────

impl IndexSpace {
    /// Computes the starting flat offset of every key, in the given order.
    pub fn flatten(entries: &[(Key, usize)]) -> Self {
        let mut offset = 0;
        let segments = entries
            .iter()
            .map(|(key, len)| {
                let segment = Segment {
                    key: key.clone(),
                    offset,
                    len: *len,
                };
                offset += len;
                segment
            })
            .collect();
        Self {
            segments,
            total: offset,
        }
    }

    /// Builds the index space of a keyed shape. Flat shapes have no keys to map to.
    pub fn from_shape(shape: &Shape) -> Result<Self, SelectionError> {
        match shape {
            Shape::Keyed(entries) => Ok(Self::flatten(entries)),
            Shape::Flat(_) => Err(SelectionError::TypeConsistency {
                expected: Layout::Keyed,
                found: Layout::Flat,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────

impl IndexSpace {
    /// Total number of flat positions.
    pub fn total_len(&self) -> usize {
        self.total
    }

    /// `(key, offset)` pairs in flattening order.
    pub fn offsets(&self) -> impl Iterator<Item = (&str, usize)> {
        self.segments.iter().map(|s| (s.key.as_str(), s.offset))
    }

    /// Starting flat offset of `key`.
    pub fn offset(&self, key: &str) -> Result<usize, SelectionError> {
        self.segment(key).map(|s| s.offset)
    }

    fn segment(&self, key: &str) -> Result<&Segment, SelectionError> {
        self.segments
            .iter()
            .find(|s| s.key == key)
            .ok_or_else(|| SelectionError::UnknownKey(key.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────────────────

impl IndexSpace {
    /// `offset(key) + local`, rejecting a local index outside the key's range.
    pub fn to_flat(&self, key: &str, local: usize) -> Result<usize, SelectionError> {
        let segment = self.segment(key)?;
        if local >= segment.len {
            return Err(SelectionError::OutOfRange {
                key: Some(key.to_string()),
                index: local,
                len: segment.len,
            });
        }
        Ok(segment.offset + local)
    }

    /// The key and local index that own a flat position, if it is in range.
    pub fn locate(&self, flat: usize) -> Option<(&str, usize)> {
        if flat >= self.total {
            return None;
        }
        // First segment ending after `flat`. Empty keys end where they start.
        let idx = self.segments.partition_point(|s| s.offset + s.len <= flat);
        self.segments
            .get(idx)
            .map(|s| (s.key.as_str(), flat - s.offset))
    }

    /// Partitions flat indices into per-key local indices.
    ///
    /// Input order does not matter; output lists are sorted and deduplicated.
    /// Every key of the space appears in the result, possibly with an empty list.
    /// Indices `>= total_len()` are dropped (see the module docs).
    pub fn to_keyed(&self, flat_ids: impl IntoIterator<Item = usize>) -> KeyedIds {
        let mut ids: Vec<usize> = flat_ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let mut per_key: KeyedIds = self
            .segments
            .iter()
            .map(|s| (s.key.clone(), Vec::new()))
            .collect();
        for (key, local) in ids.into_iter().filter_map(|id| self.locate(id)) {
            if let Some(list) = per_key.get_mut(key) {
                list.push(local);
            }
        }
        per_key
    }

    /// Inverse of [`to_keyed`](Self::to_keyed): sorted, deduplicated flat indices.
    ///
    /// Unlike `to_keyed` this is strict: unknown keys and out-of-range local
    /// indices are errors.
    pub fn flatten_ids(&self, per_key: &KeyedIds) -> Result<Vec<usize>, SelectionError> {
        let mut flat = Vec::with_capacity(per_key.values().map(Vec::len).sum());
        for (key, ids) in per_key {
            for &local in ids {
                flat.push(self.to_flat(key, local)?);
            }
        }
        flat.sort_unstable();
        flat.dedup();
        Ok(flat)
    }
}
