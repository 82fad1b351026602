mod controller;
mod decision;

pub use controller::{EarlyStopping, StoppingCriteria};
pub use decision::{ReasonCode, StoppingDecision};
