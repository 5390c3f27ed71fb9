//! Error types for COM simulation runs.

use lib_dsp::ComputationError;
use lib_touchstone::FormatError;
use thiserror::Error;

/// Errors raised while preparing or running a COM simulation.
#[derive(Debug, Error)]
pub enum ComError {
    /// Parameter validation failed; carries every violation found.
    #[error("Invalid simulation parameters: {}", .0.join("; "))]
    InvalidParameters(Vec<String>),

    /// A mapped port (or the drive port) is not in the network.
    #[error("Port mapping '{name}': port {port} out of range for {num_ports}-port network")]
    PortMapping {
        name: String,
        port: usize,
        num_ports: usize,
    },

    /// The Touchstone content could not be parsed.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Channel synthesis or eye analysis failed.
    #[error("Computation failed: {0}")]
    Computation(#[from] ComputationError),

    /// Canonical JSON encoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The run was cancelled before any port completed.
    #[error("Simulation cancelled")]
    Cancelled,
}

/// Result type for COM operations.
pub type ComResult<T> = Result<T, ComError>;
