//! Dispatch and execution of one change event.

use async_trait::async_trait;
use cdc_types::{ChangeEnvelope, ChangePayload, Op, SourceMessage};
use serde_json::Value;
use tokio_postgres::types::ToSql;
use tracing::{debug, trace};

use crate::error::{ApplyError, Result};
use crate::statement::{build_delete, build_insert, build_update};
use crate::value::PgJson;

/// The statement-execution capability.
///
/// Anything that can run parameterized SQL and report rows affected can sit
/// behind the applier: a live connection in production, a recording executor
/// in tests.
#[async_trait]
pub trait Execute {
    async fn execute(&self, sql: &str, args: &[Value]) -> anyhow::Result<u64>;
}

#[async_trait]
impl Execute for tokio_postgres::Client {
    async fn execute(&self, sql: &str, args: &[Value]) -> anyhow::Result<u64> {
        let params: Vec<PgJson<'_>> = args.iter().map(PgJson).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        Ok(tokio_postgres::Client::execute(self, sql, &refs).await?)
    }
}

/// Apply one decoded change, returning rows affected.
///
/// Dispatches on the payload's operation code. Snapshot reads are
/// intentionally ignored: they report zero rows without building a
/// statement. An unknown code is rejected here, after decode, so it drops
/// only the one message carrying it.
pub async fn apply_change<E: Execute + ?Sized>(
    executor: &E,
    payload: &ChangePayload,
) -> Result<u64> {
    let op = Op::from_code(&payload.op)
        .ok_or_else(|| ApplyError::UnsupportedOp(payload.op.clone()))?;

    let statement = match op {
        Op::Create => build_insert(payload)?,
        Op::Update => build_update(payload)?,
        Op::Delete => build_delete(payload)?,
        Op::Read => return Ok(0),
    };

    debug!(
        "Applying {} to table {}: {}",
        op, payload.source.table, statement.sql
    );

    executor
        .execute(&statement.sql, &statement.args)
        .await
        .map_err(ApplyError::Execution)
}

/// Decode a raw message and apply the change it carries.
pub async fn apply_message<E: Execute + ?Sized>(
    executor: &E,
    message: &SourceMessage,
) -> Result<u64> {
    let envelope = ChangeEnvelope::decode(&message.value)?;
    if let Some(schema) = &envelope.schema {
        trace!("Envelope schema: {schema}");
    }
    let payload = envelope.into_payload()?;
    apply_change(executor, &payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingExecutor;
    use cdc_types::EnvelopeError;
    use serde_json::json;

    fn message(v: serde_json::Value) -> SourceMessage {
        SourceMessage {
            value: serde_json::to_vec(&v).unwrap(),
            key: None,
            topic: "changes".to_string(),
            partition: 0,
            offset: 0,
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn test_create_is_applied_as_insert() {
        let executor = RecordingExecutor::new();
        let rows = apply_message(
            &executor,
            &message(json!({
                "payload": {
                    "after": {"id": 1, "name": "a"},
                    "source": {"table": "t"},
                    "op": "c"
                }
            })),
        )
        .await
        .unwrap();

        assert_eq!(rows, 1);
        let executed = executor.executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(
            executed[0].sql,
            r#"INSERT INTO "t"("id","name") VALUES ($1,$2)"#
        );
        assert_eq!(executed[0].args, vec![json!(1), json!("a")]);
    }

    #[tokio::test]
    async fn test_snapshot_read_is_a_noop() {
        let executor = RecordingExecutor::new();
        let rows = apply_message(
            &executor,
            &message(json!({
                "payload": {
                    "after": {"id": 1},
                    "source": {"table": "t"},
                    "op": "r"
                }
            })),
        )
        .await
        .unwrap();

        assert_eq!(rows, 0);
        assert!(executor.executed().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_op_is_rejected_before_building() {
        let executor = RecordingExecutor::new();
        let err = apply_message(
            &executor,
            &message(json!({
                "payload": {
                    "after": {"id": 1},
                    "source": {"table": "t"},
                    "op": "x"
                }
            })),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApplyError::UnsupportedOp(code) if code == "x"));
        assert!(executor.executed().is_empty());
    }

    #[tokio::test]
    async fn test_missing_payload_is_rejected_before_dispatch() {
        let executor = RecordingExecutor::new();
        let err = apply_message(&executor, &message(json!({ "payload": null })))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApplyError::Envelope(EnvelopeError::MissingPayload)
        ));
        assert!(executor.executed().is_empty());
    }

    #[tokio::test]
    async fn test_execution_failure_is_surfaced() {
        let executor = RecordingExecutor::new();
        executor.push_outcome(Err("duplicate key value violates unique constraint"));

        let err = apply_message(
            &executor,
            &message(json!({
                "payload": {
                    "after": {"id": 1},
                    "source": {"table": "t"},
                    "op": "c"
                }
            })),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApplyError::Execution(_)));
    }
}
