//! Error types for the sync module.

use thiserror::Error;

use synclog_core::ProtocolError;

/// Errors that can occur during sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed or misrouted message. Fatal for a run.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A drop probability outside `[0, 1]`.
    #[error("invalid drop probability {0}: must be within [0, 1]")]
    InvalidProbability(f64),

    /// Transport-level error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// The driver gave up before every agent caught up.
    #[error("not converged after {rounds} settle rounds")]
    NotConverged { rounds: u64 },

    /// Post-run verification found an inconsistency.
    #[error("verification failed: {0}")]
    VerificationFailed(String),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
