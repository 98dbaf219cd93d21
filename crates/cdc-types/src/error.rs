//! Error types for envelope decoding.

use thiserror::Error;

/// Errors that can occur while decoding a change envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// The message body is not a structurally valid envelope.
    #[error("malformed change envelope: {0}")]
    Decode(#[from] serde_json::Error),

    /// The envelope parsed but its payload is null or absent.
    #[error("change envelope has no payload")]
    MissingPayload,
}

/// Result type alias for envelope decoding.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
