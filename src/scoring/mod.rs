mod history;
mod snapshot;
mod table;

pub use history::{HistoryError, ScoringLog};
pub use snapshot::{regression_metrics, MetricSnapshot, Source};
pub use table::{ScoringRow, ScoringTable};
