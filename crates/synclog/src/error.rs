//! Error types for simulations.

use synclog_core::ProtocolError;
use synclog_sync::SyncError;
use thiserror::Error;

/// Errors that can occur while configuring or running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Sync error, including protocol errors raised mid-run.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// An agent task panicked or was cancelled.
    #[error("agent task failed: {0}")]
    TaskFailed(String),
}

impl From<ProtocolError> for SimError {
    fn from(e: ProtocolError) -> Self {
        SimError::Sync(SyncError::Protocol(e))
    }
}

/// Result type for simulations.
pub type Result<T> = std::result::Result<T, SimError>;
