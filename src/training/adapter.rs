use std::{collections::HashSet, num::NonZeroUsize, sync::Arc, time::Duration};

use super::{
    folds::{assign_folds, complement},
    unit::{Evaluation, TrainingUnit},
    EstimatorBuilder,
};
use crate::{
    configs::TrainingRequest,
    error::{Result, TrainingError},
    frame::Frame,
    resolver::{resolve_stopping_plan, StoppingPlan},
    scoring::Source,
};

/// A validated training request, split into independently trainable units.
pub(crate) struct RunPlan {
    pub family: &'static str,
    pub predictors: Vec<String>,
    /// The main model first, then one unit per cross-validation fold.
    pub units: Vec<TrainingUnit>,
    pub stopping: StoppingPlan,
    pub max_iterations: NonZeroUsize,
    pub max_runtime: Option<Duration>,
    pub seed: u64,
}

/// Turns `TrainingRequest`s into `RunPlan`s. Every configuration problem
/// surfaces here, before any iteration runs.
pub(crate) struct Adapter {
    builder: EstimatorBuilder,
}

impl Adapter {
    pub fn new() -> Self {
        Self {
            builder: EstimatorBuilder::new(),
        }
    }

    pub fn adapt(&self, request: &TrainingRequest) -> Result<RunPlan> {
        let stopping = resolve_stopping_plan(&request.config(), &request.family)?;

        let train = &request.training_frame;
        let (x_cols, y_col) = self.validate_columns(request, train, "training_frame")?;
        let nrows = train.nrows();
        if nrows == 0 {
            return Err(TrainingError::invalid(
                "training_frame",
                "training frame has no rows",
            ));
        }
        if request.nfolds > nrows {
            return Err(TrainingError::invalid(
                "nfolds",
                format!("{} folds exceed the {nrows} training row(s)", request.nfolds),
            ));
        }
        self.builder
            .validate(&request.family, request.predictors.len())?;

        let valid = match &request.validation_frame {
            Some(frame) => {
                let (vx, vy) = self.validate_columns(request, frame, "validation_frame")?;
                let rows: Vec<usize> = (0..frame.nrows()).collect();
                Some(Evaluation::new(
                    Source::Valid,
                    Arc::new(frame.gather(&rows, &vx)),
                    Arc::new(frame.gather_column(&rows, vy)),
                ))
            }
            None => None,
        };

        let seed = request.seed.unwrap_or_else(rand::random);
        let units = self.adapt_units(request, &x_cols, y_col, valid, seed);

        Ok(RunPlan {
            family: request.family.name(),
            predictors: request.predictors.clone(),
            units,
            stopping,
            max_iterations: request.max_iterations,
            max_runtime: request.max_runtime,
            seed,
        })
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Resolves predictor and response columns of `frame`.
    fn validate_columns(
        &self,
        request: &TrainingRequest,
        frame: &Frame,
        field: &'static str,
    ) -> Result<(Vec<usize>, usize)> {
        if request.predictors.is_empty() {
            return Err(TrainingError::invalid(
                "predictors",
                "at least one predictor is required",
            ));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = request.predictors.iter().find(|p| !seen.insert(p.as_str())) {
            return Err(TrainingError::invalid(
                "predictors",
                format!("predictor '{dup}' is listed twice"),
            ));
        }

        if request.predictors.contains(&request.response) {
            return Err(TrainingError::invalid(
                "response",
                format!("response '{}' is also a predictor", request.response),
            ));
        }

        let lookup = |name: &str| {
            frame.column_index(name).ok_or_else(|| {
                TrainingError::invalid(field, format!("column '{name}' not found"))
            })
        };

        let x_cols = request
            .predictors
            .iter()
            .map(|p| lookup(p))
            .collect::<Result<Vec<_>>>()?;
        let y_col = lookup(&request.response)?;

        Ok((x_cols, y_col))
    }

    // -------------------------------------------------------------------------
    // Adaptation
    // -------------------------------------------------------------------------

    fn adapt_units(
        &self,
        request: &TrainingRequest,
        x_cols: &[usize],
        y_col: usize,
        valid: Option<Evaluation>,
        seed: u64,
    ) -> Vec<TrainingUnit> {
        let train = &request.training_frame;
        let nrows = train.nrows();
        let all: Vec<usize> = (0..nrows).collect();

        let x = Arc::new(train.gather(&all, x_cols));
        let y = Arc::new(train.gather_column(&all, y_col));

        let mut evaluations = vec![Evaluation::new(Source::Train, Arc::clone(&x), Arc::clone(&y))];
        evaluations.extend(valid);

        let mut units = vec![TrainingUnit::new(
            self.builder.build(&request.family),
            seed,
            0,
            x,
            y,
            evaluations,
        )];

        if request.nfolds == 0 {
            return units;
        }

        for (k, holdout) in assign_folds(nrows, request.nfolds, seed).into_iter().enumerate() {
            let rows = complement(nrows, &holdout);
            let eval = Evaluation::new(
                Source::Fold(k),
                Arc::new(train.gather(&holdout, x_cols)),
                Arc::new(train.gather_column(&holdout, y_col)),
            );

            units.push(TrainingUnit::new(
                self.builder.build(&request.family),
                seed,
                k + 1,
                Arc::new(train.gather(&rows, x_cols)),
                Arc::new(train.gather_column(&rows, y_col)),
                vec![eval],
            ));
        }

        units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::{ModelFamily, StoppingParams, StoppingSource};

    fn frame(nrows: usize) -> Arc<Frame> {
        let rows: Vec<Vec<f64>> = (0..nrows)
            .map(|i| vec![i as f64, (i % 3) as f64, 2.0 * i as f64])
            .collect();
        Arc::new(Frame::from_rows(&["a", "b", "y"], &rows).unwrap())
    }

    fn request() -> TrainingRequest {
        TrainingRequest::new(ModelFamily::gbm(), ["a", "b"], "y", frame(12)).with_seed(7)
    }

    fn field_of(request: TrainingRequest) -> Option<&'static str> {
        Adapter::new().adapt(&request).err().and_then(|e| e.field())
    }

    #[test]
    fn one_unit_per_fold_plus_main() {
        let plan = Adapter::new().adapt(&request().with_folds(4)).unwrap();
        assert_eq!(plan.units.len(), 5);
        assert_eq!(plan.stopping.source, Source::Xval);
        assert_eq!(plan.seed, 7);
    }

    #[test]
    fn stopping_errors_come_first() {
        let bad = request()
            .with_stopping(StoppingParams::new(StoppingSource::Valid, 3, 0.01));
        assert_eq!(field_of(bad), Some("stopping_source"));
    }

    #[test]
    fn columns_are_checked() {
        let mut missing = request();
        missing.predictors.push("nope".to_string());
        assert_eq!(field_of(missing), Some("training_frame"));

        let mut dup = request();
        dup.predictors.push("a".to_string());
        assert_eq!(field_of(dup), Some("predictors"));

        let mut response = request();
        response.response = "a".to_string();
        assert_eq!(field_of(response), Some("response"));

        let rows = vec![vec![1.0, 2.0]];
        let narrow = Arc::new(Frame::from_rows(&["a", "y"], &rows).unwrap());
        assert_eq!(
            field_of(request().with_validation(narrow)),
            Some("validation_frame")
        );
    }

    #[test]
    fn folds_cannot_exceed_rows() {
        assert_eq!(field_of(request().with_folds(13)), Some("nfolds"));
        assert_eq!(field_of(request().with_folds(1)), Some("nfolds"));
    }
}
