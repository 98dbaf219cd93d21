//! Error types for the Kafka source.

use thiserror::Error;

/// Errors that can occur while setting up the Kafka consumer.
///
/// These are startup failures and are fatal to the applier; transient
/// consume errors are logged and retried inside the consumer task instead.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to create Kafka consumer: {0}")]
    Consumer(#[source] rdkafka::error::KafkaError),

    #[error("failed to subscribe to topic {topic}: {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: rdkafka::error::KafkaError,
    },
}

/// Result type alias for Kafka source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
