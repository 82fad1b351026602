use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use super::{ModelFamily, StoppingParams, TrainingConfig};
use crate::frame::Frame;

const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Everything needed to start one training run.
#[derive(Debug, Clone)]
pub struct TrainingRequest {
    pub family: ModelFamily,
    pub predictors: Vec<String>,
    pub response: String,
    pub training_frame: Arc<Frame>,
    pub validation_frame: Option<Arc<Frame>>,
    pub stopping: StoppingParams,
    pub nfolds: usize,
    pub seed: Option<u64>,
    pub max_iterations: NonZeroUsize,
    pub max_runtime: Option<Duration>,
}

impl TrainingRequest {
    /// Returns a request with default stopping parameters, no validation frame,
    /// no cross-validation and no seed.
    pub fn new<S: Into<String>>(
        family: ModelFamily,
        predictors: impl IntoIterator<Item = S>,
        response: impl Into<String>,
        training_frame: Arc<Frame>,
    ) -> Self {
        Self {
            family,
            predictors: predictors.into_iter().map(Into::into).collect(),
            response: response.into(),
            training_frame,
            validation_frame: None,
            stopping: StoppingParams::default(),
            nfolds: 0,
            seed: None,
            max_iterations: NonZeroUsize::new(DEFAULT_MAX_ITERATIONS)
                .unwrap_or(NonZeroUsize::MIN),
            max_runtime: None,
        }
    }

    pub fn with_validation<F: Into<Option<Arc<Frame>>>>(mut self, frame: F) -> Self {
        self.validation_frame = frame.into();
        self
    }

    pub fn with_stopping(mut self, stopping: StoppingParams) -> Self {
        self.stopping = stopping;
        self
    }

    pub fn with_folds(mut self, nfolds: usize) -> Self {
        self.nfolds = nfolds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: NonZeroUsize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_runtime(mut self, max_runtime: Duration) -> Self {
        self.max_runtime = Some(max_runtime);
        self
    }

    /// The stopping-relevant configuration derived from this request.
    pub fn config(&self) -> TrainingConfig {
        TrainingConfig::new(self.stopping, self.validation_frame.is_some(), self.nfolds)
    }
}
