use serde::Deserialize;

/// Which metric stream gates early stopping, as requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoppingSource {
    #[default]
    Auto,
    Train,
    Valid,
    Xval,
}

/// The metric whose time series is monitored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoppingMetric {
    #[default]
    Auto,
    Deviance,
    Mse,
    Rmse,
    Mae,
    R2,
}

impl StoppingMetric {
    /// Column name of the metric inside a snapshot, `None` for `Auto`.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::Auto => None,
            Self::Deviance => Some("deviance"),
            Self::Mse => Some("mse"),
            Self::Rmse => Some("rmse"),
            Self::Mae => Some("mae"),
            Self::R2 => Some("r2"),
        }
    }

    pub fn higher_is_better(self) -> bool {
        matches!(self, Self::R2)
    }
}

/// Early-stopping knobs, loadable from JSON.
///
/// Missing fields take the service defaults: `auto` source and metric, five
/// rounds of patience and a relative tolerance of `1e-3`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoppingParams {
    pub source: StoppingSource,
    pub rounds: usize,
    pub tolerance: f64,
    pub metric: StoppingMetric,
}

impl Default for StoppingParams {
    fn default() -> Self {
        Self {
            source: StoppingSource::Auto,
            rounds: 5,
            tolerance: 1e-3,
            metric: StoppingMetric::Auto,
        }
    }
}

impl StoppingParams {
    pub fn new(source: StoppingSource, rounds: usize, tolerance: f64) -> Self {
        Self {
            source,
            rounds,
            tolerance,
            ..Self::default()
        }
    }

    pub fn with_metric(mut self, metric: StoppingMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Parses stopping parameters from a JSON document.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// The stopping-relevant view of a training request. Built once before the
/// first iteration and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub stopping_source: StoppingSource,
    pub stopping_rounds: usize,
    pub stopping_tolerance: f64,
    pub stopping_metric: StoppingMetric,
    pub has_validation_set: bool,
    pub cross_validation_folds: usize,
}

impl TrainingConfig {
    pub fn new(params: StoppingParams, has_validation_set: bool, folds: usize) -> Self {
        Self {
            stopping_source: params.source,
            stopping_rounds: params.rounds,
            stopping_tolerance: params.tolerance,
            stopping_metric: params.metric,
            has_validation_set,
            cross_validation_folds: folds,
        }
    }
}
