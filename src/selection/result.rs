//! The durable artifact of a selection pass.

use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Key, Layout};
use crate::error::SelectionError;
use crate::exclusion::RawExclusion;
use crate::index_space::{Indices, KeyedIds};
use crate::Id;

/// Key under which a flat dataset's selection is stored.
pub const FLAT_KEY: &str = "default";

/// Which records a selection pass chose, in original dataset coordinates.
///
/// The mapping is always keyed; a flat selection lives under [`FLAT_KEY`].
/// `layout` remembers which scheme the indices belong to, so a flat result is
/// never mistaken for a keyed one whose only key happens to be `"default"`.
///
/// Created once per pass and never modified afterwards. Later passes read it
/// as an exclusion source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "StoredResult"))]
pub struct SelectionResult {
    source: Id,
    layout: Layout,
    selected_configurations: KeyedIds,
}

/// A result as read from storage, before its lists are re-canonicalized.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct StoredResult {
    source: Id,
    layout: Layout,
    selected_configurations: KeyedIds,
}

#[cfg(feature = "serde")]
impl TryFrom<StoredResult> for SelectionResult {
    type Error = SelectionError;

    /// Sorts and deduplicates every list again. A flat result must hold
    /// exactly one list, under [`FLAT_KEY`].
    fn try_from(stored: StoredResult) -> Result<Self, SelectionError> {
        let indices = match stored.layout {
            Layout::Keyed => Indices::Keyed(stored.selected_configurations),
            Layout::Flat => {
                let mut per_key = stored.selected_configurations;
                let ids = per_key.remove(FLAT_KEY).ok_or_else(|| {
                    SelectionError::MalformedResult(format!(
                        "flat result has no '{FLAT_KEY}' entry"
                    ))
                })?;
                if let Some(key) = per_key.into_keys().next() {
                    return Err(SelectionError::MalformedResult(format!(
                        "flat result stored under key '{key}'"
                    )));
                }
                Indices::Flat(ids)
            }
        };
        Ok(Self::new(stored.source, indices))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Constructors
// ─────────────────────────────────────────────────────────────────────

impl SelectionResult {
    /// Wraps original-coordinate indices produced by pass `source`.
    ///
    /// Lists are sorted and deduplicated.
    pub fn new(source: impl Into<Id>, indices: Indices) -> Self {
        let layout = indices.layout();
        let mut selected_configurations = match indices {
            Indices::Flat(ids) => KeyedIds::from([(FLAT_KEY.to_string(), ids)]),
            Indices::Keyed(per_key) => per_key,
        };
        for ids in selected_configurations.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }
        Self {
            source: source.into(),
            layout,
            selected_configurations,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────

impl SelectionResult {
    /// Name of the pass that produced this result.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// `key → sorted indices`, local to each key of the original dataset.
    pub fn selected_configurations(&self) -> &KeyedIds {
        &self.selected_configurations
    }

    pub fn get(&self, key: &str) -> Option<&[usize]> {
        self.selected_configurations.get(key).map(Vec::as_slice)
    }

    /// The selection in the dataset's own addressing scheme.
    pub fn indices(&self) -> Indices {
        match self.layout {
            Layout::Flat => {
                Indices::Flat(self.get(FLAT_KEY).map(<[_]>::to_vec).unwrap_or_default())
            }
            Layout::Keyed => Indices::Keyed(self.selected_configurations.clone()),
        }
    }

    /// Number of selected records.
    pub fn len(&self) -> usize {
        self.selected_configurations.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// This selection as an exclusion source for a later pass.
    pub fn to_exclusion(&self) -> Result<RawExclusion, SelectionError> {
        RawExclusion::try_from(self.indices())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Read views
// ─────────────────────────────────────────────────────────────────────

impl SelectionResult {
    /// The selected records of `data`, in dataset order.
    ///
    /// Fails with [`SelectionError::StaleSelection`] when `data` is keyed and
    /// its keys no longer match the stored ones.
    pub fn selected<'d, R>(&self, data: &'d Dataset<R>) -> Result<Vec<&'d R>, SelectionError> {
        self.view(data, true)
    }

    /// The records of `data` that were not selected, in dataset order.
    pub fn excluded<'d, R>(&self, data: &'d Dataset<R>) -> Result<Vec<&'d R>, SelectionError> {
        self.view(data, false)
    }

    fn view<'d, R>(
        &self,
        data: &'d Dataset<R>,
        want_selected: bool,
    ) -> Result<Vec<&'d R>, SelectionError> {
        if data.layout() != self.layout {
            return Err(SelectionError::TypeConsistency {
                expected: data.layout(),
                found: self.layout,
            });
        }
        let mut out = Vec::new();
        match data {
            Dataset::Flat(records) => pick(&mut out, records, self.get(FLAT_KEY), want_selected),
            Dataset::Keyed(groups) => {
                self.check_keys(groups.keys())?;
                for (key, records) in groups.iter() {
                    pick(&mut out, records, self.get(key), want_selected);
                }
            }
        }
        Ok(out)
    }

    fn check_keys<'k>(
        &self,
        data_keys: impl Iterator<Item = &'k Key>,
    ) -> Result<(), SelectionError> {
        let data_keys: Vec<Key> = data_keys.cloned().collect();
        let live: BTreeSet<&Key> = data_keys.iter().collect();
        let stored: BTreeSet<&Key> = self.selected_configurations.keys().collect();
        if live != stored {
            return Err(SelectionError::StaleSelection {
                selected_keys: self.selected_configurations.keys().cloned().collect(),
                data_keys,
            });
        }
        Ok(())
    }
}

fn pick<'d, R>(out: &mut Vec<&'d R>, records: &'d [R], ids: Option<&[usize]>, want_selected: bool) {
    for (i, record) in records.iter().enumerate() {
        let chosen = ids.is_some_and(|ids| ids.binary_search(&i).is_ok());
        if chosen == want_selected {
            out.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::KeyedData;

    fn ab() -> Dataset<&'static str> {
        Dataset::Keyed(
            KeyedData::from_entries(vec![
                ("a".to_string(), vec!["a0", "a1", "a2"]),
                ("b".to_string(), vec!["b0", "b1", "b2"]),
            ])
            .unwrap(),
        )
    }

    fn keyed(pairs: &[(&str, &[usize])]) -> Indices {
        Indices::Keyed(
            pairs
                .iter()
                .map(|(k, ids)| (k.to_string(), ids.to_vec()))
                .collect(),
        )
    }

    #[test]
    fn flat_result_uses_implicit_key() {
        let result = SelectionResult::new("pass", Indices::Flat(vec![4, 2, 2]));
        assert_eq!(result.layout(), Layout::Flat);
        assert_eq!(result.get(FLAT_KEY), Some(&[2, 4][..]));
        assert_eq!(result.indices(), Indices::Flat(vec![2, 4]));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn flat_result_excludes_as_flat() {
        let result = SelectionResult::new("pass", Indices::Flat(vec![1]));
        assert_eq!(result.to_exclusion(), Ok(RawExclusion::Flat(vec![1])));
    }

    #[test]
    fn keyed_result_excludes_as_mapping() {
        let result = SelectionResult::new("pass", keyed(&[("a", &[0]), ("b", &[])]));
        let Ok(RawExclusion::Keyed(map)) = result.to_exclusion() else {
            panic!("expected a keyed exclusion");
        };
        assert_eq!(map.get("a"), Some(&vec![0]));
        assert_eq!(map.get("b"), Some(&vec![]));
    }

    #[test]
    fn selected_and_excluded_views() {
        let data = ab();
        let result = SelectionResult::new("pass", keyed(&[("a", &[0]), ("b", &[2])]));
        let selected: Vec<&str> = result.selected(&data).unwrap().into_iter().copied().collect();
        let excluded: Vec<&str> = result.excluded(&data).unwrap().into_iter().copied().collect();
        assert_eq!(selected, vec!["a0", "b2"]);
        assert_eq!(excluded, vec!["a1", "a2", "b0", "b1"]);
    }

    #[test]
    fn flat_views() {
        let data = Dataset::from(vec![10, 11, 12, 13]);
        let result = SelectionResult::new("pass", Indices::Flat(vec![1, 3]));
        assert_eq!(result.selected(&data).unwrap(), vec![&11, &13]);
        assert_eq!(result.excluded(&data).unwrap(), vec![&10, &12]);
    }

    #[test]
    fn changed_keys_are_stale() {
        let data = ab();
        let result = SelectionResult::new("pass", keyed(&[("a", &[0]), ("c", &[1])]));
        let err = result.selected(&data).unwrap_err();
        assert_eq!(
            err,
            SelectionError::StaleSelection {
                data_keys: vec!["a".to_string(), "b".to_string()],
                selected_keys: vec!["a".to_string(), "c".to_string()],
            }
        );
        assert!(result.excluded(&data).is_err());
    }

    #[test]
    fn layout_mismatch_on_read() {
        let data = Dataset::from(vec![1, 2]);
        let result = SelectionResult::new("pass", keyed(&[("default", &[0])]));
        assert!(matches!(
            result.selected(&data),
            Err(SelectionError::TypeConsistency { .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let result = SelectionResult::new("pass", keyed(&[("a", &[0, 2])]));
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"selected_configurations\""));
        let back: SelectionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
