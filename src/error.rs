use thiserror::Error;

use crate::dataset::{Key, Layout, Shape};

/// Errors raised while excluding, selecting, or reading back a selection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Exclusion ids are {found} but the dataset is {expected}")]
    TypeConsistency { expected: Layout, found: Layout },

    #[error(
        "Index {index} is out of range for {} (length {len})",
        .key.as_deref().unwrap_or("flat data")
    )]
    OutOfRange {
        key: Option<Key>,
        index: usize,
        len: usize,
    },

    #[error("Strategy '{strategy}' returned index {index} but only {len} records were offered")]
    StrategyContractViolation {
        strategy: String,
        index: usize,
        len: usize,
    },

    #[error("Strategy '{strategy}' failed: {message}")]
    StrategyFailed { strategy: String, message: String },

    #[error("Dataset keys {data_keys:?} must match selected keys {selected_keys:?}")]
    StaleSelection {
        data_keys: Vec<Key>,
        selected_keys: Vec<Key>,
    },

    #[error(
        "Malformed exclusion for {}: {reason}",
        .key.as_deref().unwrap_or("flat data")
    )]
    MalformedExclusion { key: Option<Key>, reason: String },

    #[error("Key '{0}' is not part of the dataset")]
    UnknownKey(Key),

    #[error("Key '{0}' appears more than once in the dataset")]
    DuplicateKey(Key),

    #[error("Dataset shape changed from {expected:?} to {found:?} during the selection pass")]
    ShapeMismatch { expected: Shape, found: Shape },

    #[error("Stored selection result is malformed: {0}")]
    MalformedResult(String),
}
