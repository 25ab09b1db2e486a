//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum RlError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// A hyperparameter or another configuration value is out of its valid range.
    #[error("Invalid configuration of {name}: {reason}")]
    InvalidConfig {
        /// Name of the configuration value.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An action index is outside of the action space.
    #[error("Action {act} is out of range, the number of actions is {n}")]
    ActionOutOfRange {
        /// Given action index.
        act: usize,
        /// Number of actions.
        n: usize,
    },

    /// An observation does not have the dimension of the observation space.
    #[error("Observation has dimension {got}, expected {expected}")]
    ObsDimMismatch {
        /// Dimension of the observation space.
        expected: usize,
        /// Dimension of the given observation.
        got: usize,
    },

    /// An observation has a NaN or infinite element.
    #[error("Observation has a non-finite value at dimension {0}")]
    NonFiniteObs(usize),

    /// A cell index of a Q-table is out of range.
    #[error("Cell index {index} is out of range at dimension {dim} (size {size})")]
    CellOutOfRange {
        /// Dimension of the table.
        dim: usize,
        /// Given index.
        index: usize,
        /// Size of the dimension.
        size: usize,
    },

    /// A probability vector is not a valid distribution.
    #[error("Invalid probabilities: {0}")]
    InvalidProbabilities(String),

    /// Sampling from an empty buffer.
    #[error("Replay buffer is empty")]
    EmptyBuffer,
}

impl RlError {
    /// Shorthand for [`RlError::InvalidConfig`].
    pub fn invalid_config(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
