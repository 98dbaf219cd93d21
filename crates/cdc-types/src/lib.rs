//! Change envelope types for debezium-apply.
//!
//! This crate defines the shared vocabulary of the pipeline:
//!
//! - [`ChangeEnvelope`] / [`ChangePayload`] - the decoded Debezium JSON
//!   envelope describing one row-level change
//! - [`Op`] - the operation codes carried on the wire (`c`, `u`, `d`, `r`)
//! - [`SourceMessage`] - an opaque inbound message plus its delivery metadata
//! - [`EnvelopeError`] - decode failures
//!
//! # Dependency Direction
//!
//! Both the Kafka source crate and the PostgreSQL sink crate depend on this
//! crate. Neither depends on the other; a message travels from source to sink
//! only as a [`SourceMessage`].

pub mod envelope;
pub mod error;
pub mod message;
pub mod op;

pub use envelope::{ChangeEnvelope, ChangePayload, SourceInfo};
pub use error::{EnvelopeError, Result};
pub use message::SourceMessage;
pub use op::Op;
