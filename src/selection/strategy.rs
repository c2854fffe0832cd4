//! Pluggable selection strategies.

use thiserror::Error;

/// Failure reported by a strategy implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StrategyError(pub String);

impl StrategyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Picks records from the reduced sequence of a selection pass.
///
/// Implementations return positions into `records`. Every position must be
/// `< records.len()`; the runner rejects anything else. Output order does not
/// matter and duplicates collapse into one selection.
pub trait SelectionStrategy<R> {
    fn select(&mut self, records: &[&R]) -> Result<Vec<usize>, StrategyError>;

    /// Name used in logs and errors.
    fn name(&self) -> &str {
        "selection"
    }
}

/// Any `FnMut(&[&R]) -> Vec<usize>` is an infallible strategy.
impl<R, F> SelectionStrategy<R> for F
where
    F: FnMut(&[&R]) -> Vec<usize>,
{
    fn select(&mut self, records: &[&R]) -> Result<Vec<usize>, StrategyError> {
        Ok(self(records))
    }
}

/// A strategy that also sees the records a model was already trained on.
///
/// `train` is the training dataset flattened in key order; it is never
/// filtered by the pass's exclusions.
pub trait BatchSelectionStrategy<R> {
    fn select_batch(&mut self, records: &[&R], train: &[&R]) -> Result<Vec<usize>, StrategyError>;

    fn name(&self) -> &str {
        "batch selection"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EveryOther;

    impl SelectionStrategy<u32> for EveryOther {
        fn select(&mut self, records: &[&u32]) -> Result<Vec<usize>, StrategyError> {
            Ok((0..records.len()).step_by(2).collect())
        }

        fn name(&self) -> &str {
            "every-other"
        }
    }

    #[test]
    fn closure_is_a_strategy() {
        let mut last = |records: &[&u32]| vec![records.len() - 1];
        let records: [&u32; 3] = [&1, &2, &3];
        assert_eq!(SelectionStrategy::<u32>::select(&mut last, &records), Ok(vec![2]));
        assert_eq!(SelectionStrategy::<u32>::name(&last), "selection");
    }

    #[test]
    fn struct_strategy_names_itself() {
        let mut strategy = EveryOther;
        let records: [&u32; 5] = [&1, &2, &3, &4, &5];
        assert_eq!(strategy.select(&records), Ok(vec![0, 2, 4]));
        assert_eq!(strategy.name(), "every-other");
    }

    #[test]
    fn strategy_error_display() {
        assert_eq!(StrategyError::new("no energies").to_string(), "no energies");
    }
}
