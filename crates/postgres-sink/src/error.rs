//! Error types for change application.

use cdc_types::{EnvelopeError, Op};
use thiserror::Error;

/// Errors that can occur while applying one change event.
///
/// Every variant is local to a single message: the apply loop logs it and
/// moves on. Only the initial database connection, which happens before any
/// message is read, is fatal to the applier.
#[derive(Error, Debug)]
pub enum ApplyError {
    /// The message body failed to decode into an envelope.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// The row state the operation requires is absent from the payload.
    #[error("{op} change is missing its {missing} row state")]
    MissingFieldSet { op: Op, missing: &'static str },

    /// The envelope carries an operation code the applier does not know.
    #[error("unsupported operation code {0:?}")]
    UnsupportedOp(String),

    /// The database reported a failure executing the statement.
    #[error("statement execution failed: {0}")]
    Execution(#[source] anyhow::Error),
}

/// Result type alias for change application.
pub type Result<T> = std::result::Result<T, ApplyError>;
