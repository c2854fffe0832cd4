//! Selection passes: strategies, their results, and the runner tying them
//! to exclusions.
//!
//! # Examples
//!
//! ```
//! use subselect::dataset::{Dataset, KeyedData};
//! use subselect::exclusion::RawExclusion;
//! use subselect::selection::{SelectionConfig, SelectionRunner};
//!
//! let data: Dataset<&str> = KeyedData::from_entries(vec![
//!     ("a".to_string(), vec!["a0", "a1", "a2"]),
//!     ("b".to_string(), vec!["b0", "b1", "b2"]),
//! ])
//! .unwrap()
//! .into();
//!
//! let config = SelectionConfig::default()
//!     .with_name("first-and-last")
//!     .with_exclusions(RawExclusion::Keyed([("a".to_string(), vec![1])].into()));
//! let runner = SelectionRunner::new(config);
//!
//! // The strategy sees a0, a2, b0, b1, b2 and picks the first and last.
//! let mut strategy = |records: &[&&str]| vec![0, records.len() - 1];
//! let result = runner.run(&data, &mut strategy).unwrap();
//!
//! assert_eq!(result.get("a"), Some(&[0][..]));
//! assert_eq!(result.get("b"), Some(&[2][..]));
//! assert_eq!(result.selected(&data).unwrap(), vec![&"a0", &"b2"]);
//! ```

mod config;
mod render;
mod result;
mod runner;
mod strategy;


pub use config::SelectionConfig;
pub use render::{Record, RenderError, SelectionRender, SelectionTrace, TraceRecorder};
pub use result::{SelectionResult, FLAT_KEY};
pub use runner::SelectionRunner;
pub use strategy::{BatchSelectionStrategy, SelectionStrategy, StrategyError};
