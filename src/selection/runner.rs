//! One end-to-end selection pass.
//!
//! A pass moves through these steps, and produces nothing unless all of
//! them succeed:
//!
//! 1. **Gather**: union the explicit exclusions with the selections of every
//!    registered upstream result.
//! 2. **Build**: canonicalize them into an [`ExclusionSet`] for the dataset's shape.
//! 3. **Reduce**: drop the excluded records and flatten the rest.
//! 4. **Select**: run the strategy on the reduced sequence and bound-check its output.
//! 5. **Invert**: shift the strategy's indices back to original coordinates.
//!
//! The optional render sink runs last and cannot fail the pass.

use tracing::{debug, info, warn};

use super::config::SelectionConfig;
use super::render::SelectionRender;
use super::result::SelectionResult;
use super::strategy::{BatchSelectionStrategy, SelectionStrategy, StrategyError};
use crate::dataset::Dataset;
use crate::error::SelectionError;
use crate::exclusion::{ExclusionSet, RawExclusion};

/// Runs selection passes against a dataset snapshot.
///
/// The runner keeps no state between passes besides its configuration and
/// the upstream results it was given, which it only reads.
#[derive(Debug, Clone, Default)]
pub struct SelectionRunner {
    config: SelectionConfig,
    upstream: Vec<SelectionResult>,
}

impl SelectionRunner {
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            upstream: Vec::new(),
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Excludes everything `upstream` selected from this runner's passes.
    pub fn exclude(mut self, upstream: &SelectionResult) -> Self {
        self.upstream.push(upstream.clone());
        self
    }

    /// [`exclude`](Self::exclude) for several upstream results.
    pub fn exclude_all<'a>(
        mut self,
        upstream: impl IntoIterator<Item = &'a SelectionResult>,
    ) -> Self {
        self.upstream.extend(upstream.into_iter().cloned());
        self
    }

    /// Step 1: the union of explicit and upstream exclusions.
    pub fn gather_exclusions(&self) -> Result<RawExclusion, SelectionError> {
        let upstream = self
            .upstream
            .iter()
            .map(SelectionResult::to_exclusion)
            .collect::<Result<Vec<_>, _>>()?;
        RawExclusion::union_all(
            std::iter::once(self.config.exclude_configurations.clone()).chain(upstream),
        )
    }

    /// Steps 1 and 2 for `data`.
    pub fn exclusion_set<R>(&self, data: &Dataset<R>) -> Result<ExclusionSet, SelectionError> {
        let exclusion = ExclusionSet::new(data.shape(), self.gather_exclusions()?)?;
        debug!(
            pass = %self.config.name,
            excluded = exclusion.len(),
            upstream = self.upstream.len(),
            "built exclusion set"
        );
        Ok(exclusion)
    }

    /// Runs a full pass with `strategy`.
    pub fn run<R, S>(
        &self,
        data: &Dataset<R>,
        strategy: &mut S,
    ) -> Result<SelectionResult, SelectionError>
    where
        S: SelectionStrategy<R> + ?Sized,
    {
        let name = strategy.name().to_string();
        self.pass(data, &name, |records| strategy.select(records), None)
    }

    /// [`run`](Self::run), then hands the reduced records and raw strategy
    /// indices to `render`.
    pub fn run_with_render<R, S>(
        &self,
        data: &Dataset<R>,
        strategy: &mut S,
        render: &mut dyn SelectionRender<R>,
    ) -> Result<SelectionResult, SelectionError>
    where
        S: SelectionStrategy<R> + ?Sized,
    {
        let name = strategy.name().to_string();
        self.pass(data, &name, |records| strategy.select(records), Some(render))
    }

    /// Runs a full pass with a strategy that also sees `train_data`, flattened.
    pub fn run_batch<R, S>(
        &self,
        data: &Dataset<R>,
        train_data: &Dataset<R>,
        strategy: &mut S,
    ) -> Result<SelectionResult, SelectionError>
    where
        S: BatchSelectionStrategy<R> + ?Sized,
    {
        let name = strategy.name().to_string();
        let train = train_data.flatten();
        debug!(pass = %self.config.name, train = train.len(), "batch selection");
        self.pass(
            data,
            &name,
            |records| strategy.select_batch(records, &train),
            None,
        )
    }

    fn pass<R, F>(
        &self,
        data: &Dataset<R>,
        strategy: &str,
        select: F,
        render: Option<&mut dyn SelectionRender<R>>,
    ) -> Result<SelectionResult, SelectionError>
    where
        F: FnOnce(&[&R]) -> Result<Vec<usize>, StrategyError>,
    {
        let exclusion = self.exclusion_set(data)?;
        let reduced = exclusion.filter_flat(data)?;
        debug!(pass = %self.config.name, records = reduced.len(), "selecting");

        let raw_ids = select(reduced.as_slice()).map_err(|e| SelectionError::StrategyFailed {
            strategy: strategy.to_string(),
            message: e.to_string(),
        })?;
        if let Some(&index) = raw_ids.iter().find(|&&i| i >= reduced.len()) {
            return Err(SelectionError::StrategyContractViolation {
                strategy: strategy.to_string(),
                index,
                len: reduced.len(),
            });
        }

        let result =
            SelectionResult::new(self.config.name.clone(), exclusion.shift_per_key(&raw_ids));

        if let Some(render) = render {
            if let Err(e) = render.render(&reduced, &raw_ids) {
                warn!(pass = %self.config.name, error = %e, "rendering the selection failed");
            }
        }

        info!(
            pass = %self.config.name,
            strategy,
            selected = result.len(),
            "selection pass complete"
        );
        Ok(result)
    }
}
