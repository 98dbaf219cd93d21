//! The Debezium change envelope.
//!
//! A change event arrives as a JSON document with two top-level fields:
//! `schema` (the connector's declared field schema, kept only for
//! diagnostics) and `payload` (the actual change). The payload carries the
//! row state before and after the change as flat column-name-to-value maps,
//! the source metadata naming the affected table, and the operation code.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{EnvelopeError, Result};

/// A decoded change envelope.
///
/// Constructed fresh from each inbound message via [`ChangeEnvelope::decode`],
/// used to build exactly one statement, then discarded. Never mutated after
/// decode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangeEnvelope {
    /// Declared field schema; informational only.
    #[serde(default)]
    pub schema: Option<Value>,
    /// The change itself. `None` after an otherwise-successful parse is a
    /// distinct error, surfaced by [`ChangeEnvelope::into_payload`].
    #[serde(default)]
    pub payload: Option<ChangePayload>,
}

/// One row-level change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangePayload {
    /// Row state before the change; present for update/delete.
    #[serde(default)]
    pub before: Option<Map<String, Value>>,
    /// Row state after the change; present for create/update.
    #[serde(default)]
    pub after: Option<Map<String, Value>>,
    /// Where the change came from.
    pub source: SourceInfo,
    /// Wire operation code. Kept as a string so an unknown code survives
    /// decoding and is rejected at dispatch instead.
    pub op: String,
    /// Event time in milliseconds since epoch.
    #[serde(default)]
    pub ts_ms: Option<i64>,
    /// Transaction metadata; unused by the applier.
    #[serde(default)]
    pub transaction: Option<Value>,
}

/// Source metadata attached to a change.
///
/// Only `table` is load-bearing; the rest is captured for log context.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceInfo {
    /// Name of the table the change applies to.
    pub table: String,
    /// Schema the table lives in, when the connector reports one.
    #[serde(default)]
    pub schema: Option<String>,
    /// Source database name.
    #[serde(default)]
    pub db: Option<String>,
    /// Connector type, e.g. `postgresql`.
    #[serde(default)]
    pub connector: Option<String>,
}

impl ChangeEnvelope {
    /// Decode a raw message body into an envelope.
    ///
    /// Decoding is all-or-nothing: a structural failure yields
    /// [`EnvelopeError::Decode`] and no partially populated envelope.
    /// Decoding the same bytes twice yields equal envelopes.
    pub fn decode(raw: &[u8]) -> Result<ChangeEnvelope> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// Consume the envelope, returning its payload.
    ///
    /// A null payload is [`EnvelopeError::MissingPayload`].
    pub fn into_payload(self) -> Result<ChangePayload> {
        self.payload.ok_or(EnvelopeError::MissingPayload)
    }
}

impl ChangePayload {
    /// Event time as a UTC timestamp, when the connector supplied one.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.ts_ms.and_then(DateTime::from_timestamp_millis)
    }
}
