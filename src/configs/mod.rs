mod model;
mod stopping;
mod training;

pub use model::ModelFamily;
pub use stopping::{StoppingMetric, StoppingParams, StoppingSource, TrainingConfig};
pub use training::TrainingRequest;
