use crate::{
    configs::{ModelFamily, StoppingMetric, StoppingSource, TrainingConfig},
    error::{Result, TrainingError},
    scoring::Source,
};

/// The fully resolved early-stopping setup of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoppingPlan {
    pub source: Source,
    pub metric: StoppingMetric,
    pub rounds: usize,
    pub tolerance: f64,
}

impl StoppingPlan {
    pub fn is_enabled(&self) -> bool {
        self.rounds > 0
    }
}

/// Returns the concrete source whose metrics gate early stopping.
///
/// `auto` picks cross-validation when folds are configured, else the
/// validation set when one is present, else the training metrics. Forced
/// sources are checked against the available data even when stopping is
/// disabled by `stopping_rounds = 0`.
///
/// # Errors
/// Returns `InvalidConfig` if the forced source has no data behind it.
pub fn resolve_stopping_source(config: &TrainingConfig) -> Result<Source> {
    let folds = config.cross_validation_folds > 0;
    let source = match config.stopping_source {
        StoppingSource::Valid if !config.has_validation_set => {
            return Err(TrainingError::invalid(
                "stopping_source",
                "stopping on validation requires a validation set",
            ));
        }
        StoppingSource::Xval if !folds => {
            return Err(TrainingError::invalid(
                "stopping_source",
                "stopping on cross-validation requires folds > 0",
            ));
        }
        StoppingSource::Train => Source::Train,
        StoppingSource::Valid => Source::Valid,
        StoppingSource::Xval => Source::Xval,
        StoppingSource::Auto if folds => Source::Xval,
        StoppingSource::Auto if config.has_validation_set => Source::Valid,
        StoppingSource::Auto => Source::Train,
    };

    Ok(source)
}

/// Validates the stopping parameters of `config` and resolves every `auto`.
///
/// # Errors
/// Returns `InvalidConfig` naming the offending field.
pub fn resolve_stopping_plan(config: &TrainingConfig, family: &ModelFamily) -> Result<StoppingPlan> {
    let tolerance = config.stopping_tolerance;
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(TrainingError::invalid(
            "stopping_tolerance",
            format!("must be a finite value >= 0, got {tolerance}"),
        ));
    }

    if config.cross_validation_folds == 1 {
        return Err(TrainingError::invalid(
            "nfolds",
            "cross-validation needs at least 2 folds, or 0 to disable it",
        ));
    }

    let source = resolve_stopping_source(config)?;
    let metric = match config.stopping_metric {
        StoppingMetric::Auto => family.default_stopping_metric(),
        metric => metric,
    };

    log::debug!(
        "stopping on {source} {metric:?}, rounds={}, tolerance={tolerance}",
        config.stopping_rounds
    );

    Ok(StoppingPlan {
        source,
        metric,
        rounds: config.stopping_rounds,
        tolerance,
    })
}
