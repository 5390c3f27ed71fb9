//! Error types for DSP operations.

use thiserror::Error;

/// Numerical or parameter problems during analysis.
///
/// Metrics with a defined degraded value (eye width, jitter, crossing
/// percentage) never produce this error; they fall back to `0.0` instead.
#[derive(Debug, Error)]
pub enum ComputationError {
    /// Input length mismatch.
    #[error("Input length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Insufficient data for operation.
    #[error("Insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A parameter is outside its meaningful range.
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    /// A port index is not present in the network.
    #[error("Port {port} out of range for {num_ports}-port network")]
    PortOutOfRange { port: usize, num_ports: usize },

    /// Numerical instability detected.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

impl ComputationError {
    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}

/// Result type for DSP operations.
pub type DspResult<T> = Result<T, ComputationError>;
