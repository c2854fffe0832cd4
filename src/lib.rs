//! subselect - exclusion-aware selection passes over configuration datasets
//!
//! A dataset is either a flat sequence of records or a set of named groups.
//! Selection passes run a pluggable strategy over the records that earlier
//! passes (or explicit lists) have not already claimed, and report the chosen
//! records in the dataset's original coordinates so later passes can exclude
//! them in turn.

pub mod dataset;
pub mod error;
pub mod exclusion;
pub mod index_space;
pub mod selection;

pub use dataset::{Dataset, Key, KeyedData, Layout, Shape};
pub use error::SelectionError;
pub use exclusion::{ExclusionSet, RawExclusion};
pub use index_space::{IndexSpace, Indices, KeyedIds};
pub use selection::{
    BatchSelectionStrategy, SelectionConfig, SelectionResult, SelectionRunner, SelectionStrategy,
};

/// Identifier type used for selection passes.
pub type Id = String;

/// Generates a new unique identifier (UUID v4).
pub fn generate_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}
