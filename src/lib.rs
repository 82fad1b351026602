pub mod configs;
pub mod equivalence;
pub mod error;
pub mod frame;
pub mod resolver;
pub mod scoring;
mod session;
pub mod stopping;
pub mod training;

pub use equivalence::{EquivalenceChecker, Mismatch, RowSelection};
pub use error::{ErrorKind, Result, TrainingError};
pub use frame::Frame;
pub use session::Session;
pub use training::TrainedModel;

use configs::TrainingRequest;

/// Trains a single model on a short-lived session.
///
/// # Errors
/// Returns a `TrainingError` if the request is invalid or the run fails.
pub fn train(request: TrainingRequest) -> Result<TrainedModel> {
    let session = Session::open()?;
    let model = session.train(request);
    session.close();
    model
}
