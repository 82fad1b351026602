use ndarray::Array1;

use super::Estimator;
use crate::{
    error::{Result, TrainingError},
    frame::Frame,
    resolver::StoppingPlan,
    scoring::{ScoringLog, ScoringTable},
    stopping::ReasonCode,
};

/// The result of a finished (converged, exhausted or cancelled) run.
#[derive(Debug)]
pub struct TrainedModel {
    pub(super) family: &'static str,
    pub(super) predictors: Vec<String>,
    pub(super) estimator: Box<dyn Estimator>,
    pub(super) history: ScoringLog,
    pub(super) reason: ReasonCode,
    pub(super) stopping: StoppingPlan,
    pub(super) best: Option<f64>,
    pub(super) seed: u64,
}

impl TrainedModel {
    pub fn family(&self) -> &'static str {
        self.family
    }

    /// Every snapshot recorded during the run, per source.
    pub fn history(&self) -> &ScoringLog {
        &self.history
    }

    /// The exported scoring history.
    pub fn scoring_history(&self) -> ScoringTable {
        self.history.to_table()
    }

    /// Why the run stopped.
    pub fn reason(&self) -> ReasonCode {
        self.reason
    }

    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    /// The resolved stopping setup the run used.
    pub fn stopping(&self) -> &StoppingPlan {
        &self.stopping
    }

    /// Best value of the stopping metric on the monitored source.
    pub fn best_score(&self) -> Option<f64> {
        self.best
    }

    /// The seed the run used, drawn at random when the request had none.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Predicts the response for every row of `frame`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if a predictor column is missing from `frame`.
    pub fn predict(&self, frame: &Frame) -> Result<Array1<f64>> {
        let cols = self
            .predictors
            .iter()
            .map(|p| {
                frame.column_index(p).ok_or_else(|| {
                    TrainingError::invalid("frame", format!("column '{p}' not found"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let rows: Vec<usize> = (0..frame.nrows()).collect();
        Ok(self.estimator.predict(frame.gather(&rows, &cols).view()))
    }
}
