use std::fmt;

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;

use super::{DeepLearning, Gbm, RandomForest};
use crate::{
    configs::ModelFamily,
    error::{Result, TrainingError},
};

/// The training capability shared by every model family.
pub trait Estimator: Send + fmt::Debug {
    /// Advances training by one iteration over `x`/`y`.
    fn iterate(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, rng: &mut StdRng);

    /// Predicts one value per row of `x`.
    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64>;
}

/// Builds `Estimator`s given a model family.
#[derive(Default)]
pub struct EstimatorBuilder;

impl EstimatorBuilder {
    /// Creates a new `EstimatorBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Checks the family's hyperparameters against the number of predictors.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the offending hyperparameter.
    pub fn validate(&self, family: &ModelFamily, npredictors: usize) -> Result<()> {
        match *family {
            ModelFamily::DeepLearning {
                ref hidden,
                learning_rate,
            } => {
                if hidden.contains(&0) {
                    return Err(TrainingError::invalid("hidden", "hidden layers cannot be empty"));
                }
                if !(learning_rate.is_finite() && learning_rate > 0.0) {
                    return Err(TrainingError::invalid(
                        "learning_rate",
                        format!("must be a positive finite value, got {learning_rate}"),
                    ));
                }
            }
            ModelFamily::Gbm {
                learn_rate,
                min_rows,
            } => {
                if !(learn_rate > 0.0 && learn_rate <= 1.0) {
                    return Err(TrainingError::invalid(
                        "learn_rate",
                        format!("must be in (0, 1], got {learn_rate}"),
                    ));
                }
                if min_rows == 0 {
                    return Err(TrainingError::invalid("min_rows", "must be at least 1"));
                }
            }
            ModelFamily::RandomForest {
                sample_rate,
                mtries,
            } => {
                if !(sample_rate > 0.0 && sample_rate <= 1.0) {
                    return Err(TrainingError::invalid(
                        "sample_rate",
                        format!("must be in (0, 1], got {sample_rate}"),
                    ));
                }
                if mtries > npredictors {
                    return Err(TrainingError::invalid(
                        "mtries",
                        format!("{mtries} exceeds the {npredictors} predictor(s)"),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Builds a fresh, untrained estimator of the given family.
    pub fn build(&self, family: &ModelFamily) -> Box<dyn Estimator> {
        match *family {
            ModelFamily::DeepLearning {
                ref hidden,
                learning_rate,
            } => Box::new(DeepLearning::new(hidden.clone(), learning_rate)),
            ModelFamily::Gbm {
                learn_rate,
                min_rows,
            } => Box::new(Gbm::new(learn_rate, min_rows)),
            ModelFamily::RandomForest {
                sample_rate,
                mtries,
            } => Box::new(RandomForest::new(sample_rate, mtries)),
        }
    }
}
