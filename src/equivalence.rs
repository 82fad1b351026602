use std::{error::Error, fmt};

use crate::scoring::ScoringTable;

/// Which rows of the tables are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSelection {
    All,
    /// At most `n` rows spread evenly from the first to the last one.
    Sample(usize),
}

/// The first difference found between two scoring histories.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    Length {
        expected: usize,
        actual: usize,
    },
    MissingColumn {
        column: String,
    },
    Iteration {
        row: usize,
        expected: usize,
        actual: usize,
    },
    Value {
        iteration: usize,
        metric: String,
        expected: f64,
        actual: f64,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length { expected, actual } => {
                write!(f, "histories differ in length: expected {expected} rows, got {actual}")
            }
            Self::MissingColumn { column } => write!(f, "column '{column}' is missing"),
            Self::Iteration {
                row,
                expected,
                actual,
            } => write!(
                f,
                "row {row} holds iteration {actual}, expected iteration {expected}"
            ),
            Self::Value {
                iteration,
                metric,
                expected,
                actual,
            } => write!(
                f,
                "{metric} differs at iteration {iteration}: expected {expected}, got {actual}"
            ),
        }
    }
}

impl Error for Mismatch {}

/// Compares two scoring tables column by column.
///
/// Values match when they are within `tolerance` of each other, either in
/// absolute terms or relative to the larger magnitude. Two `NaN`s match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquivalenceChecker {
    tolerance: f64,
    check_sign: bool,
    rows: RowSelection,
}

impl EquivalenceChecker {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            check_sign: true,
            rows: RowSelection::All,
        }
    }

    /// Compares magnitudes only, for metrics whose sign is ambiguous.
    pub fn ignore_sign(mut self) -> Self {
        self.check_sign = false;
        self
    }

    pub fn with_rows(mut self, rows: RowSelection) -> Self {
        self.rows = rows;
        self
    }

    /// Checks `actual` against `expected` on the given metric columns.
    ///
    /// # Errors
    /// Returns the first `Mismatch` in row-major order.
    pub fn check(
        &self,
        expected: &ScoringTable,
        actual: &ScoringTable,
        metrics: &[&str],
    ) -> Result<(), Mismatch> {
        if expected.len() != actual.len() {
            return Err(Mismatch::Length {
                expected: expected.len(),
                actual: actual.len(),
            });
        }

        let mut columns = Vec::with_capacity(metrics.len());
        for &metric in metrics {
            let missing = || Mismatch::MissingColumn {
                column: metric.to_string(),
            };
            let e = expected.column_index(metric).ok_or_else(missing)?;
            let a = actual.column_index(metric).ok_or_else(missing)?;
            columns.push((metric, e, a));
        }

        for row in self.row_indices(expected.len()) {
            let (exp_row, act_row) = (&expected.rows()[row], &actual.rows()[row]);
            if exp_row.iteration != act_row.iteration {
                return Err(Mismatch::Iteration {
                    row,
                    expected: exp_row.iteration,
                    actual: act_row.iteration,
                });
            }

            for &(metric, e, a) in &columns {
                let (x, y) = (exp_row.values[e], act_row.values[a]);
                if !self.values_match(x, y) {
                    return Err(Mismatch::Value {
                        iteration: exp_row.iteration,
                        metric: metric.to_string(),
                        expected: x,
                        actual: y,
                    });
                }
            }
        }

        Ok(())
    }

    fn row_indices(&self, len: usize) -> Vec<usize> {
        match self.rows {
            RowSelection::Sample(n) if n < len => {
                if n <= 1 {
                    return (0..n).collect();
                }
                let mut rows: Vec<usize> = (0..n).map(|i| i * (len - 1) / (n - 1)).collect();
                rows.dedup();
                rows
            }
            RowSelection::All | RowSelection::Sample(_) => (0..len).collect(),
        }
    }

    fn values_match(&self, x: f64, y: f64) -> bool {
        let (x, y) = if self.check_sign {
            (x, y)
        } else {
            (x.abs(), y.abs())
        };

        if x.is_nan() || y.is_nan() {
            return x.is_nan() && y.is_nan();
        }
        if x == y {
            return true;
        }

        let diff = (x - y).abs();
        diff <= self.tolerance || diff <= self.tolerance * x.abs().max(y.abs())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::scoring::{MetricSnapshot, ScoringLog, Source};

    fn table(values: &[f64]) -> ScoringTable {
        let mut log = ScoringLog::new();
        for (i, &v) in values.iter().enumerate() {
            let metrics = BTreeMap::from([("rmse".to_string(), v), ("r2".to_string(), -v)]);
            log.append(vec![MetricSnapshot::new(i + 1, Source::Train, metrics)])
                .unwrap();
        }
        log.to_table()
    }

    #[test]
    fn identical_tables_match() {
        let t = table(&[1.0, 0.5, 0.25]);
        let checker = EquivalenceChecker::new(1e-6);
        assert_eq!(checker.check(&t, &t, &["training_rmse", "training_r2"]), Ok(()));
    }

    #[test]
    fn values_within_tolerance_match() {
        let checker = EquivalenceChecker::new(1e-6);
        let a = table(&[1.0, 1e9]);
        let b = table(&[1.0 + 1e-7, 1e9 + 100.0]);
        assert_eq!(checker.check(&a, &b, &["training_rmse"]), Ok(()));
    }

    #[test]
    fn first_mismatch_is_reported() {
        let checker = EquivalenceChecker::new(1e-6);
        let a = table(&[1.0, 0.5, 0.25]);
        let b = table(&[1.0, 0.6, 0.3]);

        let err = checker.check(&a, &b, &["training_rmse"]).unwrap_err();
        assert_eq!(
            err,
            Mismatch::Value {
                iteration: 2,
                metric: "training_rmse".to_string(),
                expected: 0.5,
                actual: 0.6,
            }
        );
    }

    #[test]
    fn repeated_checks_agree() {
        let checker = EquivalenceChecker::new(1e-6);
        let a = table(&[1.0, 0.5, 0.25]);
        let b = table(&[1.0, 0.5, 0.3]);

        let first = checker.check(&a, &b, &["training_rmse"]);
        let second = checker.check(&a, &b, &["training_rmse"]);
        assert!(first.is_err());
        assert_eq!(first, second);
    }

    #[test]
    fn length_and_missing_columns_are_reported() {
        let checker = EquivalenceChecker::new(1e-6);
        let a = table(&[1.0, 0.5]);
        let b = table(&[1.0]);

        assert_eq!(
            checker.check(&a, &b, &["training_rmse"]),
            Err(Mismatch::Length {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            checker.check(&a, &a, &["validation_rmse"]),
            Err(Mismatch::MissingColumn {
                column: "validation_rmse".to_string()
            })
        );
    }

    #[test]
    fn sign_can_be_ignored() {
        let a = table(&[1.0, 0.5]);
        let mut log = ScoringLog::new();
        for (i, v) in [1.0, 0.5].into_iter().enumerate() {
            let metrics = BTreeMap::from([("rmse".to_string(), v), ("r2".to_string(), v)]);
            log.append(vec![MetricSnapshot::new(i + 1, Source::Train, metrics)])
                .unwrap();
        }
        let b = log.to_table();

        let strict = EquivalenceChecker::new(1e-6);
        assert!(strict.check(&a, &b, &["training_r2"]).is_err());
        assert_eq!(strict.ignore_sign().check(&a, &b, &["training_r2"]), Ok(()));
    }

    #[test]
    fn nan_matches_only_nan() {
        let checker = EquivalenceChecker::new(1e-6);
        assert!(checker.values_match(f64::NAN, f64::NAN));
        assert!(!checker.values_match(f64::NAN, 1.0));
    }

    #[test]
    fn sampling_spreads_rows_evenly() {
        let checker = EquivalenceChecker::new(0.0).with_rows(RowSelection::Sample(3));
        assert_eq!(checker.row_indices(9), vec![0, 4, 8]);
        assert_eq!(checker.row_indices(2), vec![0, 1]);

        // Rows outside the sample are not inspected.
        let a = table(&[1.0, 7.0, 1.0]);
        let b = table(&[1.0, 9.0, 1.0]);
        let sparse = EquivalenceChecker::new(1e-6).with_rows(RowSelection::Sample(2));
        assert_eq!(sparse.check(&a, &b, &["training_rmse"]), Ok(()));
    }
}
