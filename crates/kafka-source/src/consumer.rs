//! Kafka consumer feeding the apply loop.
//!
//! The consumer runs in its own task and forwards every received message
//! into a bounded channel. Backpressure is the channel itself: when the
//! applier falls behind, `send().await` parks the consumer task until the
//! loop catches up, so no message is dropped between source and sink.

use cdc_types::SourceMessage;
use clap::Parser;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer as _, StreamConsumer};
use rdkafka::message::Message as _;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SourceError};

/// Configuration for the Kafka source.
#[derive(Debug, Clone, Parser)]
pub struct ConsumerConfig {
    /// Kafka brokers (comma-separated or multiple --brokers)
    #[clap(long, value_delimiter = ',', required = true, env = "KAFKA_BROKERS")]
    pub brokers: Vec<String>,

    /// Consumer group ID
    #[clap(long, default_value = "debezium-apply", env = "KAFKA_GROUP_ID")]
    pub group_id: String,

    /// Topic carrying the Debezium change events
    #[clap(long, env = "KAFKA_TOPIC")]
    pub topic: String,

    /// Session timeout in milliseconds
    #[clap(long, default_value = "30000")]
    pub session_timeout_ms: String,

    /// Where to start when the group has no committed offset
    #[clap(long, default_value = "earliest")]
    pub auto_offset_reset: String,

    /// Capacity of the channel between consumer and applier
    #[clap(long, default_value_t = 1000)]
    pub channel_capacity: usize,
}

/// A subscribed consumer-group member.
pub struct Consumer {
    inner: StreamConsumer,
    config: ConsumerConfig,
}

impl Consumer {
    /// Create the consumer and subscribe it to the configured topic.
    ///
    /// Any failure here is fatal to the applier; there is nothing to consume
    /// without a subscription.
    pub fn new(config: ConsumerConfig) -> Result<Consumer> {
        let inner: StreamConsumer = ClientConfig::new()
            .set("group.id", &config.group_id)
            .set("bootstrap.servers", config.brokers.join(","))
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", &config.auto_offset_reset)
            .set("session.timeout.ms", &config.session_timeout_ms)
            .set("enable.partition.eof", "false")
            .create()
            .map_err(SourceError::Consumer)?;

        inner
            .subscribe(&[config.topic.as_str()])
            .map_err(|e| SourceError::Subscribe {
                topic: config.topic.clone(),
                source: e,
            })?;

        info!(
            "Kafka consumer subscribed to topic {} as group {}",
            config.topic, config.group_id
        );

        Ok(Consumer { inner, config })
    }

    /// Spawn the consume task.
    ///
    /// Returns the receiving end of the message channel and the task handle.
    /// The task ends when the shutdown signal fires or the receiver is
    /// dropped; transient consume errors are logged and polling continues.
    pub fn spawn(
        self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> (mpsc::Receiver<SourceMessage>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        info!("Kafka consumer received shutdown signal");
                        break;
                    }
                    received = self.inner.recv() => match received {
                        Ok(borrowed) => {
                            let Some(value) = borrowed.payload() else {
                                warn!(
                                    "Skipping message with empty body at {}/{}@{}",
                                    borrowed.topic(),
                                    borrowed.partition(),
                                    borrowed.offset()
                                );
                                continue;
                            };
                            let message = SourceMessage {
                                value: value.to_vec(),
                                key: borrowed.key().map(|k| k.to_vec()),
                                topic: borrowed.topic().to_string(),
                                partition: borrowed.partition(),
                                offset: borrowed.offset(),
                                timestamp: borrowed.timestamp().to_millis(),
                            };
                            debug!(
                                "Received message at {}/{}@{}",
                                message.topic, message.partition, message.offset
                            );
                            if tx.send(message).await.is_err() {
                                // Applier is gone; nothing left to feed.
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Kafka consumer error (continuing): {e}");
                        }
                    }
                }
            }
        });

        (rx, handle)
    }
}
