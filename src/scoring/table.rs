use std::collections::BTreeSet;

use serde::Serialize;

use super::{ScoringLog, Source};

const EXPORTED: [Source; 3] = [Source::Train, Source::Valid, Source::Xval];

/// One exported iteration of a scoring history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringRow {
    pub iteration: usize,
    pub values: Vec<f64>,
}

/// A scoring history exported as an ordered table keyed by iteration.
///
/// Columns are `<prefix>_<metric>` for every aggregated source present in the
/// run (`training`, `validation`, `cross_validation`). The stopping source of
/// the run plays no part in the shape. Cells a source did not record are `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringTable {
    columns: Vec<String>,
    rows: Vec<ScoringRow>,
}

impl ScoringTable {
    pub(super) fn from_log(log: &ScoringLog) -> Self {
        let mut columns = Vec::new();
        let mut layout = Vec::new();
        for source in EXPORTED {
            let (Some(prefix), Some(first)) = (source.table_prefix(), log.series(source).first())
            else {
                continue;
            };
            for metric in first.values().keys() {
                columns.push(format!("{prefix}_{metric}"));
                layout.push((source, metric.as_str()));
            }
        }

        let iterations: BTreeSet<usize> = EXPORTED
            .iter()
            .flat_map(|&s| log.series(s).iter().map(|snap| snap.iteration()))
            .collect();

        let rows = iterations
            .into_iter()
            .map(|iteration| {
                let values = layout
                    .iter()
                    .map(|&(source, metric)| {
                        log.series(source)
                            .binary_search_by_key(&iteration, |s| s.iteration())
                            .ok()
                            .and_then(|i| log.series(source)[i].value(metric))
                            .unwrap_or(f64::NAN)
                    })
                    .collect();
                ScoringRow { iteration, values }
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ScoringRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Every value of a named column, in iteration order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Serializes the table to JSON. Missing cells become `null`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::scoring::MetricSnapshot;

    fn snap(iteration: usize, source: Source, v: f64) -> MetricSnapshot {
        MetricSnapshot::new(
            iteration,
            source,
            BTreeMap::from([("mae".to_string(), v), ("rmse".to_string(), v * 2.0)]),
        )
    }

    #[test]
    fn table_exports_aggregated_sources_only() {
        let mut log = ScoringLog::new();
        log.append(vec![
            snap(1, Source::Train, 1.0),
            snap(1, Source::Fold(0), 9.0),
            snap(1, Source::Xval, 3.0),
        ])
        .unwrap();
        log.append(vec![
            snap(2, Source::Train, 0.5),
            snap(2, Source::Fold(0), 8.0),
            snap(2, Source::Xval, 2.0),
        ])
        .unwrap();

        let table = log.to_table();
        assert_eq!(
            table.columns(),
            [
                "training_mae",
                "training_rmse",
                "cross_validation_mae",
                "cross_validation_rmse"
            ]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].iteration, 2);
        assert_eq!(table.column("training_rmse"), Some(vec![2.0, 1.0]));
        assert_eq!(table.column("validation_rmse"), None);
    }

    #[test]
    fn table_serializes_missing_cells_as_null() {
        let mut log = ScoringLog::new();
        log.append(vec![snap(1, Source::Train, 1.0)]).unwrap();
        log.append(vec![snap(2, Source::Train, 0.5), snap(2, Source::Valid, 0.7)])
            .unwrap();

        let table = log.to_table();
        assert!(table.rows()[0].values[2].is_nan());

        let json: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();
        assert!(json["rows"][0]["values"][2].is_null());
        assert_eq!(json["columns"][2], "validation_mae");
    }
}
