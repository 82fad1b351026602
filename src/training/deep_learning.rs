use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::{rngs::StdRng, Rng};

use super::Estimator;

/// Dense feed-forward regressor with `tanh` hidden layers and a linear
/// output, trained one full-batch gradient descent epoch per iteration.
///
/// Inputs and response are standardized with the statistics of the first
/// training frame it sees.
#[derive(Debug, Clone)]
pub struct DeepLearning {
    hidden: Vec<usize>,
    learning_rate: f64,
    net: Option<Net>,
}

#[derive(Debug, Clone)]
struct Net {
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    x_mean: Array1<f64>,
    x_scale: Array1<f64>,
    y_mean: f64,
    y_scale: f64,
}

impl DeepLearning {
    pub fn new(hidden: Vec<usize>, learning_rate: f64) -> Self {
        Self {
            hidden,
            learning_rate,
            net: None,
        }
    }

    fn init(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, rng: &mut StdRng) -> Net {
        let mut sizes = vec![x.ncols()];
        sizes.extend(&self.hidden);
        sizes.push(1);

        let (weights, biases): (Vec<_>, Vec<_>) = sizes
            .windows(2)
            .map(|dim| {
                let (fan_in, fan_out) = (dim[0], dim[1]);
                let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
                let w = Array2::from_shape_fn((fan_out, fan_in), |_| {
                    rng.random_range(-limit..=limit)
                });
                (w, Array1::zeros(fan_out))
            })
            .unzip();

        let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
        let x_scale = x.std_axis(Axis(0), 0.0).mapv(nonzero_scale);
        let y_mean = y.mean().unwrap_or(0.0);
        let y_scale = nonzero_scale(y.std(0.0));

        Net {
            weights,
            biases,
            x_mean,
            x_scale,
            y_mean,
            y_scale,
        }
    }
}

fn nonzero_scale(s: f64) -> f64 {
    if s > 0.0 && s.is_finite() {
        s
    } else {
        1.0
    }
}

impl Net {
    /// Activations of every layer, the standardized input first.
    fn forward(&self, x: ArrayView2<'_, f64>) -> Vec<Array2<f64>> {
        let input = (&x - &self.x_mean) / &self.x_scale;
        let last = self.weights.len() - 1;

        let mut acts = vec![input];
        for (l, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            let mut z = acts[l].dot(&w.t()) + b;
            if l < last {
                z.mapv_inplace(f64::tanh);
            }
            acts.push(z);
        }

        acts
    }

    fn step(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, learning_rate: f64) {
        let n = x.nrows().max(1) as f64;
        let acts = self.forward(x);
        let target = y
            .mapv(|v| (v - self.y_mean) / self.y_scale)
            .insert_axis(Axis(1));

        let mut delta = (&acts[acts.len() - 1] - &target) / n;
        for l in (0..self.weights.len()).rev() {
            let grad_w = delta.t().dot(&acts[l]);
            let grad_b = delta.sum_axis(Axis(0));

            if l > 0 {
                delta = delta.dot(&self.weights[l]) * &acts[l].mapv(|a| 1.0 - a * a);
            }

            self.weights[l].scaled_add(-learning_rate, &grad_w);
            self.biases[l].scaled_add(-learning_rate, &grad_b);
        }
    }
}

impl Estimator for DeepLearning {
    fn iterate(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, rng: &mut StdRng) {
        let learning_rate = self.learning_rate;
        let net = match self.net.take() {
            Some(net) => net,
            None => self.init(x, y, rng),
        };
        let net = self.net.insert(net);
        net.step(x, y, learning_rate);
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        let Some(net) = &self.net else {
            return Array1::zeros(x.nrows());
        };

        let acts = net.forward(x);
        acts[acts.len() - 1]
            .column(0)
            .mapv(|v| v * net.y_scale + net.y_mean)
    }
}
