use std::{collections::BTreeMap, fmt};

use ndarray::ArrayView1;
use serde::Serialize;

/// A concrete metric stream of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Train,
    Valid,
    /// Aggregate over the holdouts of every cross-validation fold.
    Xval,
    /// The holdout of a single cross-validation fold.
    Fold(usize),
}

impl Source {
    /// Column prefix used when exporting the source into a scoring table,
    /// `None` for per-fold streams which are not exported.
    pub fn table_prefix(self) -> Option<&'static str> {
        match self {
            Self::Train => Some("training"),
            Self::Valid => Some("validation"),
            Self::Xval => Some("cross_validation"),
            Self::Fold(_) => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Valid => write!(f, "valid"),
            Self::Xval => write!(f, "xval"),
            Self::Fold(k) => write!(f, "fold[{k}]"),
        }
    }
}

/// The metric values of one source after one iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSnapshot {
    iteration: usize,
    source: Source,
    values: BTreeMap<String, f64>,
}

impl MetricSnapshot {
    pub fn new(iteration: usize, source: Source, values: BTreeMap<String, f64>) -> Self {
        Self {
            iteration,
            source,
            values,
        }
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    pub fn value(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied()
    }
}

/// Gaussian regression metrics of `predicted` against `actual`.
///
/// The mean residual deviance of a gaussian model equals its mean squared
/// error. Empty inputs yield `NaN` everywhere, a constant `actual` yields a
/// `NaN` r2.
pub fn regression_metrics(
    predicted: ArrayView1<'_, f64>,
    actual: ArrayView1<'_, f64>,
) -> BTreeMap<String, f64> {
    debug_assert_eq!(predicted.len(), actual.len());

    let n = actual.len() as f64;
    let (sq, abs) = predicted
        .iter()
        .zip(actual.iter())
        .fold((0.0, 0.0), |(sq, abs), (p, a)| {
            let r = a - p;
            (sq + r * r, abs + r.abs())
        });

    let mse = sq / n;
    let mean = actual.sum() / n;
    let var = actual.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
    let r2 = if var > 0.0 { 1.0 - mse / var } else { f64::NAN };

    BTreeMap::from([
        ("deviance".to_string(), mse),
        ("mse".to_string(), mse),
        ("rmse".to_string(), mse.sqrt()),
        ("mae".to_string(), abs / n),
        ("r2".to_string(), r2),
    ])
}
