//! The apply loop.
//!
//! Consumes messages one at a time and applies each change in arrival
//! order. Ordering is load-bearing: an update or delete is only correct if
//! every earlier change to the same row has already been applied, so the
//! loop never batches or reorders.

use cdc_types::SourceMessage;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use crate::apply::{apply_message, Execute};

/// Counters for one run of the apply loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyStats {
    /// Changes that executed and affected at least one row.
    pub applied: u64,
    /// Successful executions that matched no rows.
    pub zero_rows: u64,
    /// Messages dropped because decode, dispatch or execution failed.
    pub failed: u64,
}

/// Consume messages and apply each one until shutdown.
///
/// Every error is local to the message that caused it: the loop logs it
/// with the delivery coordinates and moves on. A change that affects zero
/// rows is a warning, not an error; the intended row may already have been
/// removed, or an earlier missed update left the old row state unmatched.
///
/// Shutdown is observed only between messages, so an in-flight statement
/// always runs to completion. Once the signal fires, queued messages are
/// not drained. The loop also ends when the inbound channel closes.
pub async fn run_apply_loop<E: Execute + ?Sized>(
    executor: &E,
    mut messages: mpsc::Receiver<SourceMessage>,
    mut shutdown: broadcast::Receiver<()>,
) -> ApplyStats {
    let mut stats = ApplyStats::default();

    loop {
        tokio::select! {
            // Shutdown wins when both branches are ready.
            biased;
            _ = shutdown.recv() => {
                info!("Apply loop received shutdown signal");
                break;
            }
            received = messages.recv() => {
                let Some(message) = received else {
                    info!("Inbound channel closed, stopping apply loop");
                    break;
                };
                match apply_message(executor, &message).await {
                    Ok(0) => {
                        stats.zero_rows += 1;
                        warn!(
                            "Change at {}/{}@{} affected no rows",
                            message.topic, message.partition, message.offset
                        );
                    }
                    Ok(_) => {
                        stats.applied += 1;
                        if stats.applied % 100 == 0 {
                            info!("Applied {} changes", stats.applied);
                        }
                    }
                    Err(e) => {
                        stats.failed += 1;
                        error!(
                            "Failed to apply change at {}/{}@{}: {e}",
                            message.topic, message.partition, message.offset
                        );
                    }
                }
            }
        }
    }

    stats
}
