use std::{io, time::Instant};

use futures::future::try_join_all;
use tokio::task;
use tokio_util::sync::CancellationToken;

use super::{
    adapter::RunPlan,
    unit::{TrainingUnit, UnitScores},
    TrainedModel,
};
use crate::{
    error::Result,
    scoring::{regression_metrics, MetricSnapshot, ScoringLog, Source},
    stopping::{EarlyStopping, ReasonCode},
};

/// Runs a planned training to completion.
///
/// Iterations run one after another; inside an iteration every unit trains
/// and scores on the blocking pool. The merged batch is appended to the log
/// before the controller sees it. Cancellation and the runtime limit are
/// honored between iterations, so the returned history always ends at the
/// last completed iteration.
pub(crate) async fn run(plan: RunPlan, cancel: CancellationToken) -> Result<TrainedModel> {
    let RunPlan {
        family,
        predictors,
        mut units,
        stopping,
        max_iterations,
        max_runtime,
        seed,
    } = plan;

    log::info!(
        "training {family} (seed {seed}, {} unit(s)), stopping on {} {:?}",
        units.len(),
        stopping.source,
        stopping.metric
    );

    let deadline = max_runtime.map(|limit| Instant::now() + limit);
    let mut history = ScoringLog::new();
    let mut controller = EarlyStopping::new(&stopping);
    let mut reason = ReasonCode::ExhaustedBudget;

    for iteration in 1..=max_iterations.get() {
        let expired = deadline.is_some_and(|d| Instant::now() >= d);
        if cancel.is_cancelled() || expired {
            log::warn!(
                "{family} stopped externally after {} iteration(s)",
                history.len()
            );
            reason = ReasonCode::Cancelled;
            break;
        }

        let (stepped, batch) = score_iteration(units, iteration).await?;
        units = stepped;
        history.append(batch)?;

        let decision = controller.observe(&history);
        if decision.halt {
            reason = decision.reason;
            break;
        }
    }

    log::info!(
        "{family} finished after {} iteration(s): {reason}",
        history.len()
    );

    let estimator = units
        .into_iter()
        .next()
        .map(TrainingUnit::into_estimator)
        .ok_or_else(|| io::Error::other("run plan has no main unit"))?;

    Ok(TrainedModel {
        family,
        predictors,
        estimator,
        history,
        reason,
        stopping,
        best: controller.best(),
        seed,
    })
}

/// Advances every unit by one iteration in parallel and merges their scores
/// into one batch, ordered by source.
async fn score_iteration(
    units: Vec<TrainingUnit>,
    iteration: usize,
) -> Result<(Vec<TrainingUnit>, Vec<MetricSnapshot>)> {
    let tasks = units
        .into_iter()
        .map(|unit| task::spawn_blocking(move || unit.step()));

    let stepped = try_join_all(tasks)
        .await
        .map_err(|e| io::Error::other(format!("scoring task failed: {e}")))?;

    let mut units = Vec::with_capacity(stepped.len());
    let mut batch = Vec::new();
    let (mut pooled, mut actual) = (Vec::new(), Vec::new());

    for (unit, UnitScores { metrics, holdout }) in stepped {
        for (source, values) in metrics {
            batch.push(MetricSnapshot::new(iteration, source, values));
        }
        if let Some((predicted, y)) = holdout {
            pooled.extend(predicted.iter().copied());
            actual.extend(y.iter().copied());
        }
        units.push(unit);
    }

    if !pooled.is_empty() {
        let values = regression_metrics(
            ndarray::ArrayView1::from(&pooled),
            ndarray::ArrayView1::from(&actual),
        );
        batch.push(MetricSnapshot::new(iteration, Source::Xval, values));
    }
    batch.sort_by_key(MetricSnapshot::source);

    Ok((units, batch))
}
