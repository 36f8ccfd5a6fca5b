// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat transport for deterministic testing.
//!
//! `MockTransport` implements `ChatTransport`, capturing every outbound
//! operation for assertion and allowing scripted failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use vezha_core::error::VezhaError;
use vezha_core::traits::chat::ChatTransport;

/// One captured outbound operation, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOp {
    Send {
        chat_id: i64,
        text: String,
    },
    Reply {
        chat_id: i64,
        reply_to: i64,
        text: String,
    },
    Edit {
        chat_id: i64,
        message_id: i64,
        text: String,
    },
    Delete {
        chat_id: i64,
        message_id: i64,
    },
    Typing {
        chat_id: i64,
    },
}

/// A mock transport that records operations instead of talking to Telegram.
///
/// Successful operations are appended to an internal log. Message ids for
/// sends and replies count up from 1000. Failures can be scripted per
/// message id (deletes) or globally (sends, edits); failed operations are
/// not logged.
pub struct MockTransport {
    ops: Arc<Mutex<Vec<TransportOp>>>,
    next_message_id: AtomicI64,
    failing_deletes: Arc<Mutex<Vec<i64>>>,
    fail_sends: AtomicBool,
    fail_edits: AtomicBool,
}

impl MockTransport {
    /// Create a new mock transport with an empty operation log.
    pub fn new() -> Self {
        Self {
            ops: Arc::new(Mutex::new(Vec::new())),
            next_message_id: AtomicI64::new(1000),
            failing_deletes: Arc::new(Mutex::new(Vec::new())),
            fail_sends: AtomicBool::new(false),
            fail_edits: AtomicBool::new(false),
        }
    }

    /// All captured operations, in order.
    pub async fn operations(&self) -> Vec<TransportOp> {
        self.ops.lock().await.clone()
    }

    /// Message ids of every successful delete, in order.
    pub async fn deleted_message_ids(&self) -> Vec<i64> {
        self.ops
            .lock()
            .await
            .iter()
            .filter_map(|op| match op {
                TransportOp::Delete { message_id, .. } => Some(*message_id),
                _ => None,
            })
            .collect()
    }

    /// Make future deletes of `message_id` fail with a permission error.
    pub async fn fail_delete_of(&self, message_id: i64) {
        self.failing_deletes.lock().await.push(message_id);
    }

    /// Toggle failure of all sends and replies.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Toggle failure of all edits.
    pub fn set_fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    async fn push(&self, op: TransportOp) {
        self.ops.lock().await.push(op);
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i64, VezhaError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(VezhaError::Transport {
                message: "mock send failure".to_string(),
                source: None,
            });
        }
        self.push(TransportOp::Send {
            chat_id,
            text: text.to_string(),
        })
        .await;
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn reply_text(
        &self,
        chat_id: i64,
        reply_to: i64,
        text: &str,
    ) -> Result<i64, VezhaError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(VezhaError::Transport {
                message: "mock reply failure".to_string(),
                source: None,
            });
        }
        self.push(TransportOp::Reply {
            chat_id,
            reply_to,
            text: text.to_string(),
        })
        .await;
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), VezhaError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(VezhaError::Transport {
                message: "mock edit failure".to_string(),
                source: None,
            });
        }
        self.push(TransportOp::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), VezhaError> {
        if self.failing_deletes.lock().await.contains(&message_id) {
            return Err(VezhaError::Permission(format!(
                "cannot delete message {message_id}: no admin rights in mock chat"
            )));
        }
        self.push(TransportOp::Delete {
            chat_id,
            message_id,
        })
        .await;
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), VezhaError> {
        self.push(TransportOp::Typing { chat_id }).await;
        Ok(())
    }
}
