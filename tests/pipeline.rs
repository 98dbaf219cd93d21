//! Cross-crate pipeline tests: raw envelope bytes in, recorded SQL out.

use debezium_apply::cdc_types::SourceMessage;
use debezium_apply::postgres::testing::RecordingExecutor;
use debezium_apply::postgres::{apply_message, run_apply_loop};
use serde_json::json;
use tokio::sync::{broadcast, mpsc};

fn message(v: serde_json::Value) -> SourceMessage {
    SourceMessage {
        value: serde_json::to_vec(&v).unwrap(),
        key: None,
        topic: "cdc.public.t".to_string(),
        partition: 0,
        offset: 0,
        timestamp: None,
    }
}

#[tokio::test]
async fn test_create_envelope_becomes_insert() {
    let executor = RecordingExecutor::new();
    apply_message(
        &executor,
        &message(json!({"payload": {
            "op": "c",
            "after": {"id": 1, "name": "a"},
            "source": {"table": "t"}
        }})),
    )
    .await
    .unwrap();

    let executed = executor.executed();
    assert_eq!(
        executed[0].sql,
        r#"INSERT INTO "t"("id","name") VALUES ($1,$2)"#
    );
    assert_eq!(executed[0].args, vec![json!(1), json!("a")]);
}

#[tokio::test]
async fn test_update_envelope_becomes_update() {
    let executor = RecordingExecutor::new();
    apply_message(
        &executor,
        &message(json!({"payload": {
            "op": "u",
            "before": {"id": 1, "name": "a"},
            "after": {"id": 1, "name": "b"},
            "source": {"table": "t"}
        }})),
    )
    .await
    .unwrap();

    let executed = executor.executed();
    assert_eq!(
        executed[0].sql,
        r#"UPDATE "t" SET ("id","name")=($3,$4) WHERE ("id","name")=($1,$2)"#
    );
    assert_eq!(
        executed[0].args,
        vec![json!(1), json!("a"), json!(1), json!("b")]
    );
}

#[tokio::test]
async fn test_delete_envelope_becomes_delete() {
    let executor = RecordingExecutor::new();
    apply_message(
        &executor,
        &message(json!({"payload": {
            "op": "d",
            "before": {"id": 1},
            "source": {"table": "t"}
        }})),
    )
    .await
    .unwrap();

    let executed = executor.executed();
    assert_eq!(executed[0].sql, r#"DELETE FROM "t" WHERE ("id")=($1)"#);
    assert_eq!(executed[0].args, vec![json!(1)]);
}

#[tokio::test]
async fn test_loop_survives_unknown_op_between_valid_changes() {
    let executor = RecordingExecutor::new();
    let (tx, rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tx.send(message(json!({"payload": {
        "op": "c",
        "after": {"id": 1},
        "source": {"table": "t"}
    }})))
    .await
    .unwrap();
    tx.send(message(json!({"payload": {
        "op": "x",
        "after": {"id": 2},
        "source": {"table": "t"}
    }})))
    .await
    .unwrap();
    tx.send(message(json!({"payload": {
        "op": "c",
        "after": {"id": 3},
        "source": {"table": "t"}
    }})))
    .await
    .unwrap();
    drop(tx);

    let stats = run_apply_loop(&executor, rx, shutdown_rx).await;

    assert_eq!(stats.applied, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(executor.executed().len(), 2);
}
