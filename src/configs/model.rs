use super::StoppingMetric;

/// The closed set of model families that can be trained.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelFamily {
    /// Dense network with `tanh` hidden layers, trained by full-batch
    /// gradient descent; one iteration is one epoch.
    DeepLearning { hidden: Vec<usize>, learning_rate: f64 },
    /// Gradient-boosted regression stumps; one iteration adds one stump.
    Gbm { learn_rate: f64, min_rows: usize },
    /// Bagged regression stumps; one iteration adds one bootstrapped stump.
    RandomForest { sample_rate: f64, mtries: usize },
}

impl ModelFamily {
    pub fn deep_learning(hidden: Vec<usize>) -> Self {
        Self::DeepLearning {
            hidden,
            learning_rate: 0.05,
        }
    }

    pub fn gbm() -> Self {
        Self::Gbm {
            learn_rate: 0.1,
            min_rows: 5,
        }
    }

    pub fn random_forest() -> Self {
        Self::RandomForest {
            sample_rate: 0.632,
            mtries: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DeepLearning { .. } => "deeplearning",
            Self::Gbm { .. } => "gbm",
            Self::RandomForest { .. } => "drf",
        }
    }

    /// The metric `auto` stands for. Every family here fits a gaussian
    /// regression, whose default stopping metric is the deviance.
    pub fn default_stopping_metric(&self) -> StoppingMetric {
        match self {
            Self::DeepLearning { .. } | Self::Gbm { .. } | Self::RandomForest { .. } => {
                StoppingMetric::Deviance
            }
        }
    }
}
