use std::{collections::BTreeMap, error::Error, fmt};

use super::{MetricSnapshot, ScoringTable, Source};

/// Violations of the scoring log's append-only ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// An append would not move the source's iteration forward.
    NonIncreasing {
        source: Source,
        last: usize,
        got: usize,
    },
    /// The same source appears twice in one iteration batch.
    DuplicateSource { source: Source, iteration: usize },
    /// A batch mixes snapshots of different iterations.
    MixedIterations { expected: usize, got: usize },
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonIncreasing { source, last, got } => write!(
                f,
                "iteration {got} for {source} does not follow the last recorded iteration {last}"
            ),
            Self::DuplicateSource { source, iteration } => {
                write!(f, "{source} recorded twice at iteration {iteration}")
            }
            Self::MixedIterations { expected, got } => write!(
                f,
                "batch for iteration {expected} contains a snapshot of iteration {got}"
            ),
        }
    }
}

impl Error for HistoryError {}

/// Append-only, per-source record of a training run's metric snapshots.
///
/// Snapshots enter one iteration at a time through [`ScoringLog::append`],
/// which either records every snapshot of the batch or none of them.
#[derive(Debug, Clone, Default)]
pub struct ScoringLog {
    series: BTreeMap<Source, Vec<MetricSnapshot>>,
    iterations: usize,
    latest: Option<usize>,
}

impl ScoringLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the snapshots of one completed iteration.
    ///
    /// # Errors
    /// Returns a `HistoryError` and leaves the log untouched if the batch mixes
    /// iterations, repeats a source, or does not advance a source's iteration.
    pub fn append(&mut self, batch: Vec<MetricSnapshot>) -> Result<(), HistoryError> {
        let Some(iteration) = batch.first().map(MetricSnapshot::iteration) else {
            return Ok(());
        };

        for (i, snapshot) in batch.iter().enumerate() {
            let source = snapshot.source();
            if snapshot.iteration() != iteration {
                return Err(HistoryError::MixedIterations {
                    expected: iteration,
                    got: snapshot.iteration(),
                });
            }
            if batch[..i].iter().any(|s| s.source() == source) {
                return Err(HistoryError::DuplicateSource { source, iteration });
            }
            if let Some(last) = self.series(source).last() {
                if last.iteration() >= iteration {
                    return Err(HistoryError::NonIncreasing {
                        source,
                        last: last.iteration(),
                        got: iteration,
                    });
                }
            }
        }

        for snapshot in batch {
            self.series
                .entry(snapshot.source())
                .or_default()
                .push(snapshot);
        }
        self.iterations += 1;
        self.latest = Some(iteration);

        Ok(())
    }

    /// The full ordered series of a source, empty if it was never recorded.
    pub fn series(&self, source: Source) -> &[MetricSnapshot] {
        self.series.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The last `k` snapshots of a source, oldest first.
    pub fn last(&self, source: Source, k: usize) -> &[MetricSnapshot] {
        let series = self.series(source);
        &series[series.len().saturating_sub(k)..]
    }

    /// The most recent value of `metric` for `source`.
    pub fn latest_value(&self, source: Source, metric: &str) -> Option<f64> {
        self.series(source).last()?.value(metric)
    }

    /// The iteration of the most recently appended batch.
    pub fn latest_iteration(&self) -> Option<usize> {
        self.latest
    }

    pub fn sources(&self) -> impl Iterator<Item = Source> + '_ {
        self.series.keys().copied()
    }

    /// Number of iterations recorded.
    pub fn len(&self) -> usize {
        self.iterations
    }

    pub fn is_empty(&self) -> bool {
        self.iterations == 0
    }

    /// Exports the aggregated sources as a table keyed by iteration.
    pub fn to_table(&self) -> ScoringTable {
        ScoringTable::from_log(self)
    }
}
