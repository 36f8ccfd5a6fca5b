// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language model for deterministic testing.
//!
//! `MockModel` implements `LanguageModel` over a queue of canned
//! responses, so tests never reach a real API.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;

use vezha_core::error::VezhaError;
use vezha_core::traits::model::{FragmentStream, LanguageModel};

/// Structured default: a clean classifier verdict.
pub const NEUTRAL_REPORT: &str = r#"{"status":"NEUTRAL","toxicMessageIds":[]}"#;

/// Which [`LanguageModel`] method a recorded call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Complete,
    Structured,
    Stream,
}

/// One recorded model invocation, in call order.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub system: String,
    pub user: String,
}

/// A mock model that returns pre-configured responses.
///
/// Each call shape pops from its own FIFO queue. When a queue is empty a
/// benign default is returned: plain "mock response" text, a NEUTRAL
/// classifier verdict, or a single-fragment stream.
pub struct MockModel {
    complete_queue: Arc<Mutex<VecDeque<Result<String, VezhaError>>>>,
    structured_queue: Arc<Mutex<VecDeque<Result<String, VezhaError>>>>,
    stream_queue: Arc<Mutex<VecDeque<Vec<Result<String, VezhaError>>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockModel {
    /// Create a new mock model with empty queues.
    pub fn new() -> Self {
        Self {
            complete_queue: Arc::new(Mutex::new(VecDeque::new())),
            structured_queue: Arc::new(Mutex::new(VecDeque::new())),
            stream_queue: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a response for the next `complete` call.
    pub async fn queue_complete(&self, response: Result<String, VezhaError>) {
        self.complete_queue.lock().await.push_back(response);
    }

    /// Queue a response for the next `complete_structured` call.
    pub async fn queue_structured(&self, response: Result<String, VezhaError>) {
        self.structured_queue.lock().await.push_back(response);
    }

    /// Queue the fragment sequence yielded by the next `stream` call.
    pub async fn queue_stream(&self, fragments: Vec<Result<String, VezhaError>>) {
        self.stream_queue.lock().await.push_back(fragments);
    }

    /// All invocations made so far, in order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, kind: CallKind, system: &str, user: &str) {
        self.calls.lock().await.push(RecordedCall {
            kind,
            system: system.to_string(),
            user: user.to_string(),
        });
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, VezhaError> {
        self.record(CallKind::Complete, system, user).await;
        self.complete_queue
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("mock response".to_string()))
    }

    async fn complete_structured(
        &self,
        system: &str,
        user: &str,
    ) -> Result<String, VezhaError> {
        self.record(CallKind::Structured, system, user).await;
        self.structured_queue
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(NEUTRAL_REPORT.to_string()))
    }

    async fn stream(&self, system: &str, user: &str) -> Result<FragmentStream, VezhaError> {
        self.record(CallKind::Stream, system, user).await;
        let fragments = self
            .stream_queue
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| vec![Ok("mock fragment".to_string())]);
        Ok(Box::pin(stream::iter(fragments)))
    }
}
