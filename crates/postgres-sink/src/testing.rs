//! Test support for the sink.
//!
//! [`RecordingExecutor`] stands in for a live database connection in unit
//! and integration tests: it records every statement instead of running it
//! and replays scripted outcomes.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::apply::Execute;

/// One recorded statement execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub args: Vec<Value>,
}

/// An executor that records statements instead of running them.
///
/// Each execution consumes the next scripted outcome; once the script runs
/// dry the executor reports one row affected.
#[derive(Default)]
pub struct RecordingExecutor {
    executed: Mutex<Vec<ExecutedStatement>>,
    script: Mutex<VecDeque<Result<u64, String>>>,
}

impl RecordingExecutor {
    pub fn new() -> RecordingExecutor {
        RecordingExecutor::default()
    }

    /// Queue the outcome for the next execution.
    pub fn push_outcome(&self, outcome: Result<u64, &str>) {
        self.script
            .lock()
            .unwrap()
            .push_back(outcome.map_err(String::from));
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Execute for RecordingExecutor {
    async fn execute(&self, sql: &str, args: &[Value]) -> anyhow::Result<u64> {
        self.executed.lock().unwrap().push(ExecutedStatement {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(1),
        }
    }
}
