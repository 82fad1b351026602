mod adapter;
mod deep_learning;
mod driver;
mod estimator;
mod folds;
mod gbm;
mod model;
mod random_forest;
mod stump;
mod unit;

pub(crate) use adapter::Adapter;
pub(crate) use driver::run;

pub use deep_learning::DeepLearning;
pub use estimator::{Estimator, EstimatorBuilder};
pub use gbm::Gbm;
pub use model::TrainedModel;
pub use random_forest::RandomForest;
