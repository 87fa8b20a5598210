//! Error types for the simulation and aggregation core.

use thiserror::Error;

/// Errors raised by the simulator and the aggregator.
///
/// All of them are caller contract violations: valid [`ExperimentParameters`]
/// never produce one.
///
/// [`ExperimentParameters`]: crate::params::ExperimentParameters
#[derive(Debug, Error)]
pub enum WealthError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("trajectory of individual {id} has length {got}, expected {expected}")]
    TrajectoryLength {
        id: usize,
        expected: usize,
        got: usize,
    },
}

/// Alias for `Result<T, WealthError>`.
pub type WealthResult<T> = Result<T, WealthError>;
