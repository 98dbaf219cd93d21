//! Kafka source for debezium-apply.
//!
//! Subscribes a consumer-group member to the topic carrying Debezium change
//! events and forwards each raw message into a bounded channel as a
//! [`cdc_types::SourceMessage`]. The sink side never sees a Kafka type.
//!
//! Offsets are auto-committed: a message that later fails to apply is not
//! redelivered by this crate. Redelivery, if wanted, is the bus's concern.

pub mod consumer;
pub mod error;

pub use consumer::{Consumer, ConsumerConfig};
pub use error::{Result, SourceError};
