use std::fmt;

use serde::Serialize;

/// Why a run continues or stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReasonCode {
    Continuing,
    Converged,
    ExhaustedBudget,
    InvalidConfig,
    /// Stopped from outside: user abort or runtime limit.
    Cancelled,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Continuing => "continuing",
            Self::Converged => "converged",
            Self::ExhaustedBudget => "exhausted-budget",
            Self::InvalidConfig => "invalid-config",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// The verdict after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoppingDecision {
    pub halt: bool,
    pub reason: ReasonCode,
}

impl StoppingDecision {
    pub const CONTINUE: Self = Self {
        halt: false,
        reason: ReasonCode::Continuing,
    };

    pub fn halt(reason: ReasonCode) -> Self {
        Self { halt: true, reason }
    }

    pub fn converged() -> Self {
        Self::halt(ReasonCode::Converged)
    }
}
