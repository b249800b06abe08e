//! Executors shared by the unit tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::executor::BatchExecutor;

/// Answers every operation `n` with `n * 10` and records each batch.
#[derive(Default)]
pub(crate) struct EchoExecutor {
    batches: Mutex<Vec<Vec<i64>>>,
}

impl EchoExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn batches(&self) -> Vec<Vec<i64>> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl BatchExecutor<i64, i64> for EchoExecutor {
    async fn execute(&self, operations: &[i64]) -> anyhow::Result<Vec<i64>> {
        self.batches.lock().push(operations.to_vec());
        Ok(operations.iter().map(|op| op * 10).collect())
    }
}

/// Replays canned responses in order and records the batches it was sent.
pub(crate) struct Scripted {
    responses: Mutex<VecDeque<anyhow::Result<Vec<String>>>>,
    calls: Mutex<Vec<Vec<&'static str>>>,
}

impl Scripted {
    pub(crate) fn new(responses: Vec<anyhow::Result<Vec<String>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Vec<&'static str>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl BatchExecutor<&'static str, String> for Scripted {
    async fn execute(&self, operations: &[&'static str]) -> anyhow::Result<Vec<String>> {
        self.calls.lock().push(operations.to_vec());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted response left")))
    }
}
