use std::{collections::BTreeMap, sync::Arc};

use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, SeedableRng};

use super::Estimator;
use crate::scoring::{regression_metrics, Source};

const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// A held-out (or training) set one unit is scored on.
#[derive(Debug, Clone)]
pub(crate) struct Evaluation {
    source: Source,
    x: Arc<Array2<f64>>,
    y: Arc<Array1<f64>>,
}

impl Evaluation {
    pub fn new(source: Source, x: Arc<Array2<f64>>, y: Arc<Array1<f64>>) -> Self {
        Self { source, x, y }
    }
}

/// What a unit produced during one iteration.
#[derive(Debug)]
pub(super) struct UnitScores {
    pub metrics: Vec<(Source, BTreeMap<String, f64>)>,
    /// Fold predictions and actuals, pooled into the cross-validation aggregate.
    pub holdout: Option<(Array1<f64>, Arc<Array1<f64>>)>,
}

/// One independently trained estimator of a run: the main model or a
/// cross-validation fold model. Owns its data views and its RNG.
#[derive(Debug)]
pub(crate) struct TrainingUnit {
    estimator: Box<dyn Estimator>,
    rng: StdRng,
    x: Arc<Array2<f64>>,
    y: Arc<Array1<f64>>,
    evaluations: Vec<Evaluation>,
}

impl TrainingUnit {
    /// Creates a unit whose RNG is derived from the run `seed` and the unit's
    /// position, so every unit draws an independent, reproducible stream.
    pub fn new(
        estimator: Box<dyn Estimator>,
        seed: u64,
        index: usize,
        x: Arc<Array2<f64>>,
        y: Arc<Array1<f64>>,
        evaluations: Vec<Evaluation>,
    ) -> Self {
        let unit_seed = seed.wrapping_add(SEED_STRIDE.wrapping_mul(index as u64 + 1));
        Self {
            estimator,
            rng: StdRng::seed_from_u64(unit_seed),
            x,
            y,
            evaluations,
        }
    }

    /// Trains one iteration and scores every evaluation set.
    ///
    /// Takes `self` by value so it can run on the blocking pool and be handed
    /// back afterwards.
    pub(super) fn step(mut self) -> (Self, UnitScores) {
        self.estimator
            .iterate(self.x.view(), self.y.view(), &mut self.rng);

        let mut metrics = Vec::with_capacity(self.evaluations.len());
        let mut holdout = None;
        for eval in &self.evaluations {
            let predicted = self.estimator.predict(eval.x.view());
            metrics.push((eval.source, regression_metrics(predicted.view(), eval.y.view())));
            if matches!(eval.source, Source::Fold(_)) {
                holdout = Some((predicted, Arc::clone(&eval.y)));
            }
        }

        (self, UnitScores { metrics, holdout })
    }

    pub fn into_estimator(self) -> Box<dyn Estimator> {
        self.estimator
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::training::Gbm;

    fn unit(index: usize, holdout: Source) -> TrainingUnit {
        let x = Arc::new(array![[0.0], [1.0], [2.0], [3.0]]);
        let y = Arc::new(array![0.0, 1.0, 2.0, 3.0]);
        let evaluations = vec![
            Evaluation::new(Source::Train, Arc::clone(&x), Arc::clone(&y)),
            Evaluation::new(holdout, Arc::new(array![[1.5]]), Arc::new(array![1.5])),
        ];
        TrainingUnit::new(Box::new(Gbm::new(0.5, 1)), 9, index, x, y, evaluations)
    }

    #[test]
    fn step_scores_every_evaluation_in_order() {
        let (_, scores) = unit(0, Source::Valid).step();

        let sources: Vec<Source> = scores.metrics.iter().map(|(s, _)| *s).collect();
        assert_eq!(sources, vec![Source::Train, Source::Valid]);
        assert!(scores.metrics[0].1.contains_key("deviance"));
        assert!(scores.holdout.is_none());
    }

    #[test]
    fn fold_units_hand_back_their_holdout() {
        let (unit, scores) = unit(1, Source::Fold(0)).step();

        let (predicted, actual) = scores.holdout.unwrap();
        assert_eq!(predicted.len(), 1);
        assert_eq!(actual.to_vec(), vec![1.5]);

        // The unit comes back usable for the next iteration.
        let (_, again) = unit.step();
        assert_eq!(again.metrics.len(), 2);
    }
}
