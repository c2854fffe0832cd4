//! A canonical exclusion set bound to one dataset shape.
//!
//! [`ExclusionSet`] owns sorted, deduplicated exclusion ids that have been
//! validated against a [`Shape`]. It removes those records from a dataset
//! ([`filter`](ExclusionSet::filter)) and maps indices chosen from the
//! reduced sequence back to the original dataset
//! ([`shift`](ExclusionSet::shift)).
//!
//! # Invariants
//!
//! - `ids` has the same layout as `shape`.
//! - Every flat index is `< shape.total_len()`; every keyed index is below its
//!   key's length and every key exists in `shape`.
//! - `flat` is the same set expressed in flattened coordinates, sorted
//!   ascending. `shift` relies on this order.

use tracing::debug;

use super::raw::RawExclusion;
use crate::dataset::{Dataset, KeyedData, Shape};
use crate::error::SelectionError;
use crate::index_space::{IndexSpace, Indices, KeyedIds};

/// Exclusion ids validated against a dataset shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    shape: Shape,
    ids: Indices,
    flat: Vec<usize>,
}

/// Outcome of a lenient construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Canonicalized {
    Set(ExclusionSet),
    /// The raw ids did not match the dataset layout and were passed through unchanged.
    Ignored(RawExclusion),
}

// ─────────────────────────────────────────────────────────────────────
// Constructors
// ─────────────────────────────────────────────────────────────────────

impl ExclusionSet {
    /// Canonicalizes `raw` against `shape`.
    ///
    /// Fails with [`SelectionError::TypeConsistency`] when `raw` is flat and
    /// the shape keyed (or the reverse), and with `OutOfRange`, `UnknownKey`
    /// or `MalformedExclusion` for invalid ids.
    pub fn new(shape: Shape, raw: RawExclusion) -> Result<Self, SelectionError> {
        check_layout(&shape, &raw)?;
        Self::canonical(shape, &raw)
    }

    /// Like [`new`](Self::new), but a layout mismatch hands `raw` back
    /// untouched instead of failing. Invalid ids of the right layout still fail.
    pub fn new_lenient(shape: Shape, raw: RawExclusion) -> Result<Canonicalized, SelectionError> {
        if let Err(SelectionError::TypeConsistency { expected, found }) = check_layout(&shape, &raw)
        {
            debug!(%expected, %found, "ignoring exclusion ids of foreign layout");
            return Ok(Canonicalized::Ignored(raw));
        }
        Self::canonical(shape, &raw).map(Canonicalized::Set)
    }

    /// An exclusion set that excludes nothing.
    pub fn empty(shape: Shape) -> Self {
        let ids = Indices::empty(shape.layout());
        Self {
            shape,
            ids,
            flat: Vec::new(),
        }
    }

    fn canonical(shape: Shape, raw: &RawExclusion) -> Result<Self, SelectionError> {
        match raw.canonicalize()? {
            Some(ids) => Self::from_indices(shape, ids),
            None => Ok(Self::empty(shape)),
        }
    }

    /// Validates canonical ids against `shape` and caches their flat form.
    fn from_indices(shape: Shape, ids: Indices) -> Result<Self, SelectionError> {
        let flat = match (&shape, &ids) {
            (Shape::Flat(len), Indices::Flat(list)) => {
                if let Some(&index) = list.iter().find(|&&i| i >= *len) {
                    return Err(SelectionError::OutOfRange {
                        key: None,
                        index,
                        len: *len,
                    });
                }
                list.clone()
            }
            (Shape::Keyed(entries), Indices::Keyed(per_key)) => {
                IndexSpace::flatten(entries).flatten_ids(per_key)?
            }
            _ => {
                return Err(SelectionError::TypeConsistency {
                    expected: shape.layout(),
                    found: ids.layout(),
                })
            }
        };
        Ok(Self { shape, ids, flat })
    }
}

// ─────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────

impl ExclusionSet {
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The canonical ids in the dataset's own addressing scheme.
    pub fn ids(&self) -> &Indices {
        &self.ids
    }

    /// The excluded ids in flattened coordinates, sorted ascending.
    pub fn as_flat(&self) -> &[usize] {
        &self.flat
    }

    /// Number of excluded records.
    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// Number of records that survive the exclusion.
    pub fn reduced_len(&self) -> usize {
        self.shape.total_len() - self.flat.len()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Merging
// ─────────────────────────────────────────────────────────────────────

impl ExclusionSet {
    /// Union with another exclusion set built for the same shape.
    pub fn merge(&self, other: &ExclusionSet) -> Result<ExclusionSet, SelectionError> {
        if self.shape != other.shape {
            return Err(SelectionError::ShapeMismatch {
                expected: self.shape.clone(),
                found: other.shape.clone(),
            });
        }
        let ids = match (&self.ids, &other.ids) {
            (Indices::Flat(a), Indices::Flat(b)) => Indices::Flat(union_sorted(a, b)),
            (Indices::Keyed(a), Indices::Keyed(b)) => Indices::Keyed(union_keyed(a, b)),
            _ => {
                return Err(SelectionError::TypeConsistency {
                    expected: self.ids.layout(),
                    found: other.ids.layout(),
                })
            }
        };
        let merged = Self::from_indices(self.shape.clone(), ids)?;
        debug!(excluded = merged.len(), "merged exclusion sets");
        Ok(merged)
    }

    /// Union with a per-key mapping, e.g. the selection of an upstream pass.
    pub fn merge_keyed(&self, per_key: &KeyedIds) -> Result<ExclusionSet, SelectionError> {
        let mut canonical = per_key.clone();
        for ids in canonical.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }
        let other = Self::from_indices(self.shape.clone(), Indices::Keyed(canonical))?;
        self.merge(&other)
    }
}

fn check_layout(shape: &Shape, raw: &RawExclusion) -> Result<(), SelectionError> {
    match raw.layout() {
        Some(found) if found != shape.layout() => Err(SelectionError::TypeConsistency {
            expected: shape.layout(),
            found,
        }),
        _ => Ok(()),
    }
}

fn union_sorted(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let next = a[i].min(b[j]);
        if a[i] == next {
            i += 1;
        }
        if b[j] == next {
            j += 1;
        }
        out.push(next);
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

fn union_keyed(a: &KeyedIds, b: &KeyedIds) -> KeyedIds {
    let mut out = a.clone();
    for (key, ids) in b {
        let merged = match out.get(key) {
            Some(existing) => union_sorted(existing, ids),
            None => ids.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}

// ─────────────────────────────────────────────────────────────────────
// Filtering
// ─────────────────────────────────────────────────────────────────────

impl ExclusionSet {
    /// Returns `data` without the excluded records, keeping relative order and
    /// per-key grouping.
    ///
    /// `data` must have exactly the shape this set was built for.
    pub fn filter<'d, R>(&self, data: &'d Dataset<R>) -> Result<Dataset<&'d R>, SelectionError> {
        self.check_shape(data)?;
        match (data, &self.ids) {
            (Dataset::Flat(records), Indices::Flat(ids)) => {
                Ok(Dataset::Flat(retain_unexcluded(records, ids)))
            }
            (Dataset::Keyed(groups), Indices::Keyed(per_key)) => {
                let entries = groups.iter().map(|(key, records)| {
                    let kept = match per_key.get(key) {
                        Some(ids) => retain_unexcluded(records, ids),
                        None => records.iter().collect(),
                    };
                    (key.clone(), kept)
                });
                Ok(Dataset::Keyed(KeyedData::from_entries(entries)?))
            }
            _ => Err(SelectionError::TypeConsistency {
                expected: data.layout(),
                found: self.ids.layout(),
            }),
        }
    }

    /// The reduced sequence handed to a selection strategy: [`filter`](Self::filter)
    /// followed by concatenation in key order.
    pub fn filter_flat<'d, R>(&self, data: &'d Dataset<R>) -> Result<Vec<&'d R>, SelectionError> {
        self.check_shape(data)?;
        let all = data.flatten();
        let mut reduced = Vec::with_capacity(self.reduced_len());
        let mut excluded = self.flat.iter().peekable();
        for (i, record) in all.into_iter().enumerate() {
            if excluded.next_if_eq(&&i).is_none() {
                reduced.push(record);
            }
        }
        Ok(reduced)
    }

    fn check_shape<R>(&self, data: &Dataset<R>) -> Result<(), SelectionError> {
        if data.layout() != self.shape.layout() {
            return Err(SelectionError::TypeConsistency {
                expected: data.layout(),
                found: self.shape.layout(),
            });
        }
        let found = data.shape();
        if found != self.shape {
            return Err(SelectionError::ShapeMismatch {
                expected: self.shape.clone(),
                found,
            });
        }
        Ok(())
    }
}

fn retain_unexcluded<'d, R>(records: &'d [R], sorted_ids: &[usize]) -> Vec<&'d R> {
    records
        .iter()
        .enumerate()
        .filter(|(i, _)| sorted_ids.binary_search(i).is_err())
        .map(|(_, record)| record)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────
// Shifting
// ─────────────────────────────────────────────────────────────────────

impl ExclusionSet {
    /// Maps positions in the reduced sequence back to flat positions in the
    /// original dataset.
    ///
    /// Every excluded flat index `e` opened a gap: all surviving records after
    /// it moved down by one. Walking the exclusions in ascending order and
    /// bumping each id that has reached `e` closes those gaps again, which
    /// solves `original = reduced + |{e ∈ excluded : e <= original}|`.
    ///
    /// Input need not be sorted; the output is sorted ascending. Duplicates
    /// are kept. With no exclusions this is the identity (after sorting).
    pub fn shift(&self, reduced: &[usize]) -> Vec<usize> {
        let mut ids = reduced.to_vec();
        ids.sort_unstable();
        // `passed` is monotonic because ids ascend.
        let mut passed = 0;
        for id in ids.iter_mut() {
            while passed < self.flat.len() && self.flat[passed] <= *id + passed {
                passed += 1;
            }
            *id += passed;
        }
        ids
    }

    /// [`shift`](Self::shift) followed by re-keying onto the dataset's own
    /// addressing scheme.
    ///
    /// Flat shapes yield sorted, deduplicated flat ids. Keyed shapes go through
    /// [`IndexSpace::to_keyed`], so every key of the shape is present and ids
    /// past the end of the dataset are dropped.
    pub fn shift_per_key(&self, reduced: &[usize]) -> Indices {
        let mut original = self.shift(reduced);
        match &self.shape {
            Shape::Flat(_) => {
                original.dedup();
                Indices::Flat(original)
            }
            Shape::Keyed(entries) => {
                Indices::Keyed(IndexSpace::flatten(entries).to_keyed(original))
            }
        }
    }
}
