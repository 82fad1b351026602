use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;

use crate::{
    configs::TrainingRequest,
    error::Result,
    training::{self, Adapter, TrainedModel},
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the runtime training runs execute on.
///
/// Every piece of state a run needs travels inside its `TrainingRequest`, so
/// one session can serve any number of independent runs.
pub struct Session {
    runtime: Runtime,
    adapter: Adapter,
}

impl Session {
    /// Creates a new `Session` backed by a multi-threaded runtime.
    ///
    /// # Returns
    /// A new `Session` or an io error if the runtime could not be built.
    pub fn open() -> Result<Self> {
        let runtime = Builder::new_multi_thread().enable_all().build()?;
        log::info!("training session opened");

        Ok(Self {
            runtime,
            adapter: Adapter::new(),
        })
    }

    /// Trains a model until it converges, exhausts its iteration budget or
    /// hits its runtime limit.
    ///
    /// # Arguments
    /// * `request` - The model family, data and stopping setup of the run.
    ///
    /// # Returns
    /// The trained model along with its scoring history.
    ///
    /// # Errors
    /// Returns `InvalidConfig` before any iteration runs if the request is
    /// inconsistent.
    pub fn train(&self, request: TrainingRequest) -> Result<TrainedModel> {
        self.train_with_cancel(request, CancellationToken::new())
    }

    /// Same as `train`, but the run also stops once `cancel` fires.
    ///
    /// # Arguments
    /// * `request` - The model family, data and stopping setup of the run.
    /// * `cancel` - Checked between iterations.
    ///
    /// # Returns
    /// The trained model, holding every iteration completed before the stop.
    pub fn train_with_cancel(
        &self,
        request: TrainingRequest,
        cancel: CancellationToken,
    ) -> Result<TrainedModel> {
        log::info!("adapting {} request", request.family.name());
        let plan = self.adapter.adapt(&request)?;
        self.runtime.block_on(training::run(plan, cancel))
    }

    /// Shuts the runtime down, waiting a bounded time for blocking tasks.
    pub fn close(self) {
        self.runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
        log::info!("training session closed");
    }
}
