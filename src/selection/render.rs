//! Diagnostic output of a selection pass.
//!
//! A [`SelectionRender`] sink is notified after a pass with the reduced
//! records and the strategy's raw indices (positions in the reduced
//! sequence). Sinks cannot fail a pass: the runner logs their errors and
//! carries on.

use thiserror::Error;

/// Per-record properties a diagnostic plot can use.
pub trait Record {
    /// Potential energy of the record, when one has been computed.
    fn potential_energy(&self) -> Option<f64> {
        None
    }
}

/// Failure reported by a render sink.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RenderError(pub String);

/// Receives the outcome of a pass for plotting or inspection.
pub trait SelectionRender<R> {
    fn render(&mut self, records: &[&R], indices: &[usize]) -> Result<(), RenderError>;
}

/// The series behind a selection plot.
///
/// `line` holds one value per reduced record: its potential energy when every
/// record has one, otherwise its position. `points` marks the selected
/// records on that line.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionTrace {
    pub y_label: &'static str,
    pub line: Vec<f64>,
    pub points: Vec<(usize, f64)>,
}

impl SelectionTrace {
    pub fn new<R: Record>(records: &[&R], indices: &[usize]) -> Self {
        let energies: Option<Vec<f64>> = records.iter().map(|r| r.potential_energy()).collect();
        let (y_label, line) = match energies {
            Some(line) => ("Energy", line),
            None => ("Configuration", (0..records.len()).map(|i| i as f64).collect()),
        };
        let points = indices
            .iter()
            .filter_map(|&i| line.get(i).map(|&y| (i, y)))
            .collect();
        Self {
            y_label,
            line,
            points,
        }
    }
}

/// A sink that keeps the [`SelectionTrace`] of the last pass.
#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    last: Option<SelectionTrace>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&SelectionTrace> {
        self.last.as_ref()
    }
}

impl<R: Record> SelectionRender<R> for TraceRecorder {
    fn render(&mut self, records: &[&R], indices: &[usize]) -> Result<(), RenderError> {
        self.last = Some(SelectionTrace::new(records, indices));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Frame(Option<f64>);

    impl Record for Frame {
        fn potential_energy(&self) -> Option<f64> {
            self.0
        }
    }

    #[test]
    fn energies_drive_the_line() {
        let frames = [Frame(Some(-1.0)), Frame(Some(-3.0)), Frame(Some(-2.0))];
        let records: Vec<&Frame> = frames.iter().collect();
        let trace = SelectionTrace::new(&records, &[1]);
        assert_eq!(trace.y_label, "Energy");
        assert_eq!(trace.line, vec![-1.0, -3.0, -2.0]);
        assert_eq!(trace.points, vec![(1, -3.0)]);
    }

    #[test]
    fn missing_energy_falls_back_to_positions() {
        let frames = [Frame(Some(-1.0)), Frame(None), Frame(Some(-2.0))];
        let records: Vec<&Frame> = frames.iter().collect();
        let trace = SelectionTrace::new(&records, &[0, 2]);
        assert_eq!(trace.y_label, "Configuration");
        assert_eq!(trace.line, vec![0.0, 1.0, 2.0]);
        assert_eq!(trace.points, vec![(0, 0.0), (2, 2.0)]);
    }

    #[test]
    fn recorder_keeps_last_trace() {
        let frames = [Frame(None), Frame(None)];
        let records: Vec<&Frame> = frames.iter().collect();
        let mut recorder = TraceRecorder::new();
        assert!(recorder.last().is_none());
        recorder.render(&records, &[1]).unwrap();
        assert_eq!(recorder.last().map(|t| t.points.len()), Some(1));
    }
}
