//! An insertion-ordered container of named record lists.
//!
//! [`KeyedData`] wraps a `Vec<(Key, Vec<R>)>` and guarantees that every key
//! appears at most once. Iteration order is insertion order and defines the
//! canonical flattening of the dataset.

use std::ops::Deref;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Key;
use crate::error::SelectionError;

/// Named sub-collections of records with unique keys.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<(Key, Vec<R>)>"))]
#[cfg_attr(feature = "serde", serde(into = "Vec<(Key, Vec<R>)>"))]
#[cfg_attr(feature = "serde", serde(bound(serialize = "R: Clone + Serialize")))]
#[cfg_attr(feature = "serde", serde(bound(deserialize = "R: Deserialize<'de>")))]
pub struct KeyedData<R>(Vec<(Key, Vec<R>)>);

// ─────────────────────────────────────────────────────────────────────
// Constructors
// ─────────────────────────────────────────────────────────────────────

impl<R> KeyedData<R> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds from `(key, records)` pairs, rejecting repeated keys.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (Key, Vec<R>)>,
    ) -> Result<Self, SelectionError> {
        let mut data = Self::new();
        for (key, records) in entries {
            data.insert(key, records)?;
        }
        Ok(data)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Mutation
// ─────────────────────────────────────────────────────────────────────

impl<R> KeyedData<R> {
    /// Appends a new key at the end of the flattening order.
    pub fn insert(&mut self, key: impl Into<Key>, records: Vec<R>) -> Result<(), SelectionError> {
        let key = key.into();
        if self.contains_key(&key) {
            return Err(SelectionError::DuplicateKey(key));
        }
        self.0.push((key, records));
        Ok(())
    }

    pub fn into_inner(self) -> Vec<(Key, Vec<R>)> {
        self.0
    }
}

// ─────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────

impl<R> KeyedData<R> {
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&[R]> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, records)| records.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.0.iter().map(|(k, _)| k)
    }

    /// Number of records across all keys.
    pub fn total_len(&self) -> usize {
        self.0.iter().map(|(_, records)| records.len()).sum()
    }
}

impl<R> Default for KeyedData<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Deref for KeyedData<R> {
    type Target = [(Key, Vec<R>)];

    fn deref(&self) -> &[(Key, Vec<R>)] {
        &self.0
    }
}

impl<R> TryFrom<Vec<(Key, Vec<R>)>> for KeyedData<R> {
    type Error = SelectionError;

    fn try_from(entries: Vec<(Key, Vec<R>)>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl<R> From<KeyedData<R>> for Vec<(Key, Vec<R>)> {
    fn from(data: KeyedData<R>) -> Self {
        data.0
    }
}

impl<'a, R> IntoIterator for &'a KeyedData<R> {
    type Item = &'a (Key, Vec<R>);
    type IntoIter = std::slice::Iter<'a, (Key, Vec<R>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_order() {
        let mut data = KeyedData::new();
        data.insert("b", vec![1, 2]).unwrap();
        data.insert("a", vec![3]).unwrap();
        let keys: Vec<_> = data.keys().cloned().collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(data.total_len(), 3);
    }

    #[test]
    fn duplicate_key_rejected() {
        let mut data = KeyedData::new();
        data.insert("a", vec![1]).unwrap();
        assert_eq!(
            data.insert("a", vec![2]),
            Err(SelectionError::DuplicateKey("a".to_string()))
        );
        assert_eq!(data.get("a"), Some(&[1][..]));
    }

    #[test]
    fn from_entries_rejects_duplicates() {
        let entries = vec![("a".to_string(), vec![1]), ("a".to_string(), vec![2])];
        assert!(KeyedData::from_entries(entries).is_err());
    }

    #[test]
    fn get_missing_key() {
        let data = KeyedData::from_entries(vec![("a".to_string(), vec![1])]).unwrap();
        assert!(data.get("b").is_none());
        assert!(data.contains_key("a"));
    }

    #[test]
    fn deref_provides_slice_methods() {
        let data =
            KeyedData::from_entries(vec![("a".to_string(), vec![1]), ("b".to_string(), vec![])])
                .unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[1].0, "b");
    }
}
