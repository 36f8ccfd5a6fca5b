// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging transport seam (Telegram in production).

use async_trait::async_trait;

use crate::error::VezhaError;

/// Outbound side of the messaging platform.
///
/// All calls are keyed by chat id and message id and are best-effort: the
/// platform gives no delivery guarantee, and callers degrade gracefully on
/// failure. Implementations own their formatting concerns -- a rejected
/// rich-text send or edit is retried once as plain text before the error
/// surfaces here.
#[async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    /// Sends formatted text without notifying chat members (the moderator
    /// voice). Returns the new message id.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i64, VezhaError>;

    /// Sends formatted text as a regular, notifying reply to `reply_to`.
    async fn reply_text(&self, chat_id: i64, reply_to: i64, text: &str)
        -> Result<i64, VezhaError>;

    /// Replaces the text of an already-sent message. An edit to identical
    /// content is a successful no-op.
    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str)
        -> Result<(), VezhaError>;

    /// Removes a message from the chat. Fails with [`VezhaError::Permission`]
    /// when the bot lacks admin rights in the chat.
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), VezhaError>;

    /// Shows the "typing…" indicator, best-effort.
    async fn send_typing(&self, chat_id: i64) -> Result<(), VezhaError>;
}
