use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;

use super::{stump::Stump, Estimator};

/// Gradient boosting of regression stumps on the squared loss.
#[derive(Debug, Clone)]
pub struct Gbm {
    learn_rate: f64,
    min_rows: usize,
    init: Option<f64>,
    stumps: Vec<Stump>,
}

impl Gbm {
    pub fn new(learn_rate: f64, min_rows: usize) -> Self {
        Self {
            learn_rate,
            min_rows,
            init: None,
            stumps: Vec::new(),
        }
    }

    pub fn ntrees(&self) -> usize {
        self.stumps.len()
    }
}

impl Estimator for Gbm {
    fn iterate(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, _rng: &mut StdRng) {
        if self.init.is_none() {
            self.init = y.mean();
        }

        let residuals = &y - &self.predict(x);
        let rows: Vec<usize> = (0..x.nrows()).collect();
        let features: Vec<usize> = (0..x.ncols()).collect();

        let stump = Stump::fit(x, residuals.view(), &rows, &features, self.min_rows);
        self.stumps.push(stump);
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let init = self.init.unwrap_or(0.0);
        x.axis_iter(Axis(0))
            .map(|row| {
                let boost: f64 = self.stumps.iter().map(|s| s.predict_row(row)).sum();
                init + self.learn_rate * boost
            })
            .collect()
    }
}
