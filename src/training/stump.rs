use ndarray::{ArrayView1, ArrayView2};

/// A depth-one regression tree.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Stump {
    feature: usize,
    threshold: f64,
    left: f64,
    right: f64,
}

impl Stump {
    /// Fits the split of `features` that most reduces the squared error of
    /// `y` over `rows`, keeping at least `min_rows` rows on each side.
    ///
    /// Falls back to a constant leaf when no split qualifies.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        rows: &[usize],
        features: &[usize],
        min_rows: usize,
    ) -> Self {
        let n = rows.len();
        let total: f64 = rows.iter().map(|&r| y[r]).sum();
        let mean = if n > 0 { total / n as f64 } else { 0.0 };

        let mut best = Self::leaf(mean);
        let mut best_gain = 0.0;
        let min_rows = min_rows.max(1);

        let mut order = rows.to_vec();
        for &f in features {
            order.sort_by(|&a, &b| x[[a, f]].total_cmp(&x[[b, f]]));

            let mut left_sum = 0.0;
            for i in 0..n.saturating_sub(1) {
                left_sum += y[order[i]];
                let (lo, hi) = (x[[order[i], f]], x[[order[i + 1], f]]);
                let (left_n, right_n) = (i + 1, n - i - 1);
                if lo == hi || left_n < min_rows || right_n < min_rows {
                    continue;
                }

                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / left_n as f64
                    + right_sum * right_sum / right_n as f64
                    - total * total / n as f64;

                if gain > best_gain {
                    best_gain = gain;
                    best = Self {
                        feature: f,
                        threshold: lo + (hi - lo) / 2.0,
                        left: left_sum / left_n as f64,
                        right: right_sum / right_n as f64,
                    };
                }
            }
        }

        best
    }

    fn leaf(value: f64) -> Self {
        Self {
            feature: 0,
            threshold: f64::INFINITY,
            left: value,
            right: value,
        }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        if row.is_empty() || row[self.feature] <= self.threshold {
            self.left
        } else {
            self.right
        }
    }
}
