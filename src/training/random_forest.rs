use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom};

use super::{stump::Stump, Estimator};

/// Averaged regression stumps, each grown on a row sample and a random
/// subset of the predictors.
#[derive(Debug, Clone)]
pub struct RandomForest {
    sample_rate: f64,
    mtries: usize,
    stumps: Vec<Stump>,
}

impl RandomForest {
    /// `mtries = 0` picks a third of the predictors, the regression default.
    pub fn new(sample_rate: f64, mtries: usize) -> Self {
        Self {
            sample_rate,
            mtries,
            stumps: Vec::new(),
        }
    }

    fn features_per_split(&self, ncols: usize) -> usize {
        match self.mtries {
            0 => (ncols / 3).max(1),
            m => m.min(ncols),
        }
    }
}

impl Estimator for RandomForest {
    fn iterate(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, rng: &mut StdRng) {
        let mut rows: Vec<usize> = (0..x.nrows()).collect();
        rows.shuffle(rng);
        let sampled = ((rows.len() as f64 * self.sample_rate).round() as usize).max(1);
        rows.truncate(sampled);

        let mut features: Vec<usize> = (0..x.ncols()).collect();
        features.shuffle(rng);
        features.truncate(self.features_per_split(x.ncols()));

        self.stumps.push(Stump::fit(x, y, &rows, &features, 1));
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        if self.stumps.is_empty() {
            return Array1::zeros(x.nrows());
        }

        let ntrees = self.stumps.len() as f64;
        x.axis_iter(Axis(0))
            .map(|row| self.stumps.iter().map(|s| s.predict_row(row)).sum::<f64>() / ntrees)
            .collect()
    }
}
