use std::{fmt, io};

use crate::scoring::HistoryError;

/// The result type used across training runs.
pub type Result<T> = std::result::Result<T, TrainingError>;

/// Coarse classification of a `TrainingError`, so callers can tell setup
/// problems apart from failures while the run was executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidConfig,
    Runtime,
}

/// All errors that can occur while setting up or running a training.
#[derive(Debug)]
pub enum TrainingError {
    /// Invalid configuration, caught before the first iteration.
    InvalidConfig { field: &'static str, msg: String },
    /// The scoring log rejected an append.
    History(HistoryError),
    /// The runtime or one of its scoring tasks failed.
    Runtime(io::Error),
}

impl TrainingError {
    pub(crate) fn invalid(field: &'static str, msg: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            msg: msg.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            Self::History(_) | Self::Runtime(_) => ErrorKind::Runtime,
        }
    }

    /// The offending field for configuration errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl fmt::Display for TrainingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { field, msg } => write!(f, "invalid config ({field}): {msg}"),
            Self::History(e) => write!(f, "scoring history error: {e}"),
            Self::Runtime(e) => write!(f, "runtime error: {e}"),
        }
    }
}

impl std::error::Error for TrainingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::History(e) => Some(e),
            Self::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TrainingError {
    fn from(e: io::Error) -> Self {
        Self::Runtime(e)
    }
}

impl From<HistoryError> for TrainingError {
    fn from(e: HistoryError) -> Self {
        Self::History(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_names_the_field() {
        let err = TrainingError::invalid("stopping_source", "nope");
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert_eq!(err.field(), Some("stopping_source"));
        assert_eq!(err.to_string(), "invalid config (stopping_source): nope");
    }

    #[test]
    fn io_errors_are_runtime_errors() {
        let err: TrainingError = io::Error::other("boom").into();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert_eq!(err.field(), None);
    }
}
