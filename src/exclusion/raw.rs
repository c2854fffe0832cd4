//! Exclusion ids as callers hand them in, before canonicalization.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{Key, Layout};
use crate::error::SelectionError;
use crate::index_space::{Indices, KeyedIds};

/// The accepted input forms for exclusion ids.
///
/// With the `serde` feature this is untagged, so `null`, `[1, 2]`,
/// `[{"a": [1]}, {"a": [3]}]` and `{"a": [1]}` all deserialize directly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RawExclusion {
    /// Nothing to exclude.
    #[default]
    None,
    /// Indices into a flat dataset.
    Flat(Vec<i64>),
    /// Several per-key mappings; lists under the same key accumulate.
    Sources(Vec<BTreeMap<Key, Vec<i64>>>),
    /// A single per-key mapping.
    Keyed(BTreeMap<Key, Vec<i64>>),
}

impl RawExclusion {
    /// The addressing family of the ids. `None` carries no family.
    pub fn layout(&self) -> Option<Layout> {
        match self {
            RawExclusion::None => None,
            RawExclusion::Flat(_) => Some(Layout::Flat),
            RawExclusion::Sources(_) | RawExclusion::Keyed(_) => Some(Layout::Keyed),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, RawExclusion::None)
    }

    /// Unions two raw exclusions without losing any index.
    ///
    /// Same-key lists are concatenated, never overwritten. The operation is
    /// associative and, after canonicalization, commutative. Combining a flat
    /// and a keyed exclusion is a [`SelectionError::TypeConsistency`].
    pub fn union(self, other: RawExclusion) -> Result<RawExclusion, SelectionError> {
        match (self, other) {
            (RawExclusion::None, other) => Ok(other),
            (this, RawExclusion::None) => Ok(this),
            (RawExclusion::Flat(mut a), RawExclusion::Flat(b)) => {
                a.extend(b);
                Ok(RawExclusion::Flat(a))
            }
            (RawExclusion::Flat(_), _) => Err(SelectionError::TypeConsistency {
                expected: Layout::Flat,
                found: Layout::Keyed,
            }),
            (_, RawExclusion::Flat(_)) => Err(SelectionError::TypeConsistency {
                expected: Layout::Keyed,
                found: Layout::Flat,
            }),
            (this, other) => {
                let mut sources = this.into_sources();
                sources.extend(other.into_sources());
                Ok(RawExclusion::Sources(sources))
            }
        }
    }

    /// Folds any number of exclusions with [`union`](Self::union).
    pub fn union_all(
        exclusions: impl IntoIterator<Item = RawExclusion>,
    ) -> Result<RawExclusion, SelectionError> {
        exclusions
            .into_iter()
            .try_fold(RawExclusion::None, RawExclusion::union)
    }

    fn into_sources(self) -> Vec<BTreeMap<Key, Vec<i64>>> {
        match self {
            RawExclusion::Sources(sources) => sources,
            RawExclusion::Keyed(map) => vec![map],
            RawExclusion::None | RawExclusion::Flat(_) => Vec::new(),
        }
    }

    /// Sorts and deduplicates into canonical form. `None` stays `None`.
    ///
    /// Negative indices are a [`SelectionError::MalformedExclusion`]. Range
    /// checks need the dataset shape and happen in `ExclusionSet`.
    pub fn canonicalize(&self) -> Result<Option<Indices>, SelectionError> {
        match self {
            RawExclusion::None => {
                debug!("exclusion ids are empty");
                Ok(None)
            }
            RawExclusion::Flat(ids) => {
                debug!(count = ids.len(), "exclusion ids are a flat list");
                Ok(Some(Indices::Flat(canonical_list(None, ids)?)))
            }
            RawExclusion::Sources(sources) => {
                debug!(sources = sources.len(), "exclusion ids are a list of mappings");
                let mut merged: BTreeMap<&Key, Vec<i64>> = BTreeMap::new();
                for source in sources {
                    for (key, ids) in source {
                        merged.entry(key).or_default().extend_from_slice(ids);
                    }
                }
                let mut per_key = KeyedIds::new();
                for (key, ids) in merged {
                    per_key.insert(key.clone(), canonical_list(Some(key), &ids)?);
                }
                Ok(Some(Indices::Keyed(per_key)))
            }
            RawExclusion::Keyed(map) => {
                debug!(keys = map.len(), "exclusion ids are a mapping");
                let mut per_key = KeyedIds::new();
                for (key, ids) in map {
                    per_key.insert(key.clone(), canonical_list(Some(key), ids)?);
                }
                Ok(Some(Indices::Keyed(per_key)))
            }
        }
    }
}

fn canonical_list(key: Option<&Key>, ids: &[i64]) -> Result<Vec<usize>, SelectionError> {
    let mut list = ids
        .iter()
        .map(|&id| {
            usize::try_from(id).map_err(|_| SelectionError::MalformedExclusion {
                key: key.cloned(),
                reason: format!("index {id} is negative"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    list.sort_unstable();
    list.dedup();
    Ok(list)
}

impl From<Vec<i64>> for RawExclusion {
    fn from(ids: Vec<i64>) -> Self {
        RawExclusion::Flat(ids)
    }
}

impl From<BTreeMap<Key, Vec<i64>>> for RawExclusion {
    fn from(map: BTreeMap<Key, Vec<i64>>) -> Self {
        RawExclusion::Keyed(map)
    }
}

impl From<Vec<BTreeMap<Key, Vec<i64>>>> for RawExclusion {
    fn from(sources: Vec<BTreeMap<Key, Vec<i64>>>) -> Self {
        RawExclusion::Sources(sources)
    }
}

impl TryFrom<Indices> for RawExclusion {
    type Error = SelectionError;

    /// Fails with [`SelectionError::MalformedExclusion`] for an index above `i64::MAX`.
    fn try_from(indices: Indices) -> Result<Self, SelectionError> {
        Ok(match indices {
            Indices::Flat(ids) => RawExclusion::Flat(widen(None, ids)?),
            Indices::Keyed(per_key) => RawExclusion::Keyed(
                per_key
                    .into_iter()
                    .map(|(key, ids)| widen(Some(&key), ids).map(|ids| (key, ids)))
                    .collect::<Result<_, SelectionError>>()?,
            ),
        })
    }
}

fn widen(key: Option<&Key>, ids: Vec<usize>) -> Result<Vec<i64>, SelectionError> {
    ids.into_iter()
        .map(|id| {
            i64::try_from(id).map_err(|_| SelectionError::MalformedExclusion {
                key: key.cloned(),
                reason: format!("index {id} does not fit an exclusion id"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &[i64])]) -> BTreeMap<Key, Vec<i64>> {
        pairs
            .iter()
            .map(|(k, ids)| (k.to_string(), ids.to_vec()))
            .collect()
    }

    fn keyed(pairs: &[(&str, &[usize])]) -> Indices {
        Indices::Keyed(
            pairs
                .iter()
                .map(|(k, ids)| (k.to_string(), ids.to_vec()))
                .collect(),
        )
    }

    // ── Canonicalization ──────────────────────────────────────────────

    #[test]
    fn none_stays_none() {
        assert_eq!(RawExclusion::None.canonicalize(), Ok(None));
    }

    #[test]
    fn flat_is_sorted_and_deduplicated() {
        let raw = RawExclusion::Flat(vec![5, 1, 3, 1]);
        assert_eq!(raw.canonicalize(), Ok(Some(Indices::Flat(vec![1, 3, 5]))));
    }

    #[test]
    fn mapping_is_sorted_per_key() {
        let raw = RawExclusion::from(map(&[("a", &[2, 0, 2]), ("b", &[1])]));
        assert_eq!(
            raw.canonicalize(),
            Ok(Some(keyed(&[("a", &[0, 2]), ("b", &[1])])))
        );
    }

    #[test]
    fn sources_accumulate_same_key() {
        let raw = RawExclusion::from(vec![map(&[("a", &[0])]), map(&[("a", &[2]), ("b", &[1])])]);
        assert_eq!(
            raw.canonicalize(),
            Ok(Some(keyed(&[("a", &[0, 2]), ("b", &[1])])))
        );
    }

    #[test]
    fn negative_index_is_malformed() {
        let raw = RawExclusion::from(map(&[("a", &[1, -1])]));
        assert_eq!(
            raw.canonicalize(),
            Err(SelectionError::MalformedExclusion {
                key: Some("a".to_string()),
                reason: "index -1 is negative".to_string(),
            })
        );
    }

    // ── Union ─────────────────────────────────────────────────────────

    #[test]
    fn union_with_none_is_identity() {
        let raw = RawExclusion::Flat(vec![1, 2]);
        assert_eq!(RawExclusion::None.union(raw.clone()), Ok(raw.clone()));
        assert_eq!(raw.clone().union(RawExclusion::None), Ok(raw));
    }

    #[test]
    fn union_flat_concatenates() {
        let u = RawExclusion::Flat(vec![3]).union(RawExclusion::Flat(vec![1, 3]));
        assert_eq!(u, Ok(RawExclusion::Flat(vec![3, 1, 3])));
    }

    #[test]
    fn union_keyed_never_overwrites() {
        let u = RawExclusion::union_all(vec![
            RawExclusion::from(map(&[("a", &[0])])),
            RawExclusion::from(map(&[("a", &[2])])),
        ])
        .unwrap();
        assert_eq!(u.canonicalize(), Ok(Some(keyed(&[("a", &[0, 2])]))));
    }

    #[test]
    fn union_mixed_layouts_fails() {
        let err = RawExclusion::Flat(vec![1])
            .union(RawExclusion::from(map(&[("a", &[0])])))
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::TypeConsistency {
                expected: Layout::Flat,
                found: Layout::Keyed,
            }
        );
    }

    #[test]
    fn union_is_idempotent_after_canonicalization() {
        let source = RawExclusion::from(map(&[("a", &[4, 1]), ("b", &[0])]));
        let once = source.canonicalize().unwrap();
        let twice = source
            .clone()
            .union(source)
            .unwrap()
            .canonicalize()
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn indices_convert_back() {
        let raw = RawExclusion::try_from(keyed(&[("a", &[1])]));
        assert_eq!(raw, Ok(RawExclusion::Keyed(map(&[("a", &[1])]))));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn oversized_index_does_not_wrap() {
        let too_big = i64::MAX as usize + 1;
        assert_eq!(
            RawExclusion::try_from(Indices::Flat(vec![0, too_big])),
            Err(SelectionError::MalformedExclusion {
                key: None,
                reason: format!("index {too_big} does not fit an exclusion id"),
            })
        );
        assert!(matches!(
            RawExclusion::try_from(keyed(&[("a", &[too_big])])),
            Err(SelectionError::MalformedExclusion { key: Some(_), .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_every_form() {
        let none: RawExclusion = serde_json::from_str("null").unwrap();
        assert_eq!(none, RawExclusion::None);
        let flat: RawExclusion = serde_json::from_str("[3, 1]").unwrap();
        assert_eq!(flat, RawExclusion::Flat(vec![3, 1]));
        let sources: RawExclusion = serde_json::from_str(r#"[{"a": [1]}, {"a": [2]}]"#).unwrap();
        assert_eq!(
            sources,
            RawExclusion::Sources(vec![map(&[("a", &[1])]), map(&[("a", &[2])])])
        );
        let keyed: RawExclusion = serde_json::from_str(r#"{"a": [1]}"#).unwrap();
        assert_eq!(keyed, RawExclusion::Keyed(map(&[("a", &[1])])));
    }
}
