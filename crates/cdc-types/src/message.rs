//! Inbound message types.
//!
//! A [`SourceMessage`] is what the message bus hands the applier: the raw
//! envelope bytes plus delivery metadata. The applier treats the body as
//! opaque until decode; the metadata only ever feeds log context.

/// A raw message from the bus with its delivery metadata.
#[derive(Debug, Clone)]
pub struct SourceMessage {
    /// Raw message body containing the JSON change envelope.
    pub value: Vec<u8>,
    /// Message key (if any).
    pub key: Option<Vec<u8>>,
    /// Topic the message was read from.
    pub topic: String,
    /// Partition number.
    pub partition: i32,
    /// Offset within the partition.
    pub offset: i64,
    /// Broker timestamp in milliseconds since epoch (if available).
    pub timestamp: Option<i64>,
}
