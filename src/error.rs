//! Error taxonomy of the detection pipeline.

use thiserror::Error;

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The window is too short for the configured minimum segment length.
    ///
    /// Fatal only to the household window being processed.
    #[error("insufficient data: need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Systemic misconfiguration, raised before any household is processed.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The series violates the regular-sampling contract.
    #[error("invalid series at sample #{index}: {reason}")]
    InvalidSeries { index: usize, reason: String },
}

impl Error {
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name, reason: reason.into() }
    }

    pub fn invalid_series(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidSeries { index, reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::InsufficientData { needed: 4, got: 1 }.to_string(),
            "insufficient data: need at least 4 samples, got 1",
        );
        assert_eq!(
            Error::invalid_parameter("penalty", "must not be negative").to_string(),
            "invalid parameter `penalty`: must not be negative",
        );
    }
}
