//! Error types for synclog core.

use thiserror::Error;

use crate::messages::MessageKind;

/// Protocol errors.
///
/// These indicate an encoding or integration bug upstream, never message
/// loss. Loss is modeled as an absent message, not as an error.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unrecognized message kind: {0}")]
    UnrecognizedKind(String),

    #[error("message has no kind field")]
    MissingKind,

    #[error("{receiver} cannot handle {kind} messages")]
    UnexpectedKind {
        kind: MessageKind,
        receiver: &'static str,
    },

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
