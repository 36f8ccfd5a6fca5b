// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram transport for the Vezha moderation agent.
//!
//! Implements [`ChatTransport`] over the Telegram Bot API via teloxide,
//! plus the long-polling [`UpdateListener`] that feeds chat events to
//! the agent loop. Outbound text goes out as MarkdownV2 and degrades to
//! plain text when Telegram rejects the formatting.

pub mod listener;
pub mod markdown;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, MessageId, ParseMode, Recipient, ReplyParameters};
use tracing::warn;

use vezha_config::model::TelegramConfig;
use vezha_core::error::VezhaError;
use vezha_core::traits::chat::ChatTransport;

pub use listener::UpdateListener;

/// Telegram implementation of [`ChatTransport`].
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Creates the transport. Requires `telegram.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, VezhaError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            VezhaError::Config(
                "telegram.bot_token is not set; add it to vezha.toml or export \
                 VEZHA_TELEGRAM_BOT_TOKEN"
                    .into(),
            )
        })?;
        if token.is_empty() {
            return Err(VezhaError::Config(
                "telegram.bot_token is empty".into(),
            ));
        }

        Ok(Self {
            bot: Bot::new(token),
        })
    }

    /// The underlying teloxide bot, shared with the update listener.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    async fn send_with_fallback(
        &self,
        chat_id: i64,
        text: &str,
        silent: bool,
        reply_to: Option<i64>,
    ) -> Result<i64, VezhaError> {
        let recipient = Recipient::Id(ChatId(chat_id));
        let escaped = markdown::escape_markdown_v2(text);
        let reply_params = reply_to
            .map(|id| Ok::<_, VezhaError>(ReplyParameters::new(message_id(id)?)))
            .transpose()?;

        let mut request = self
            .bot
            .send_message(recipient.clone(), &escaped)
            .parse_mode(ParseMode::MarkdownV2)
            .disable_notification(silent);
        if let Some(params) = reply_params.clone() {
            request = request.reply_parameters(params);
        }

        match request.await {
            Ok(sent) => Ok(i64::from(sent.id.0)),
            Err(err) => {
                warn!(chat_id, error = %err, "MarkdownV2 send failed, retrying as plain text");
                let mut request = self
                    .bot
                    .send_message(recipient, text)
                    .disable_notification(silent);
                if let Some(params) = reply_params {
                    request = request.reply_parameters(params);
                }
                let sent = request.await.map_err(|err| VezhaError::Transport {
                    message: format!("failed to send message: {err}"),
                    source: Some(Box::new(err)),
                })?;
                Ok(i64::from(sent.id.0))
            }
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<i64, VezhaError> {
        self.send_with_fallback(chat_id, text, true, None).await
    }

    async fn reply_text(
        &self,
        chat_id: i64,
        reply_to: i64,
        text: &str,
    ) -> Result<i64, VezhaError> {
        self.send_with_fallback(chat_id, text, false, Some(reply_to))
            .await
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id_raw: i64,
        text: &str,
    ) -> Result<(), VezhaError> {
        let chat = ChatId(chat_id);
        let msg_id = message_id(message_id_raw)?;
        let escaped = markdown::escape_markdown_v2(text);

        let result = self
            .bot
            .edit_message_text(chat, msg_id, &escaped)
            .parse_mode(ParseMode::MarkdownV2)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let description = err.to_string();
                if description.contains("message is not modified") {
                    // Re-sending identical content is a successful no-op.
                    return Ok(());
                }
                if description.contains("can't parse entities") {
                    warn!(chat_id, error = %err, "MarkdownV2 edit failed, retrying as plain text");
                    self.bot
                        .edit_message_text(chat, msg_id, text)
                        .await
                        .map_err(|err| VezhaError::Transport {
                            message: format!("failed to edit message: {err}"),
                            source: Some(Box::new(err)),
                        })?;
                    return Ok(());
                }
                Err(VezhaError::Transport {
                    message: format!("failed to edit message: {err}"),
                    source: Some(Box::new(err)),
                })
            }
        }
    }

    async fn delete_message(&self, chat_id: i64, message_id_raw: i64) -> Result<(), VezhaError> {
        let msg_id = message_id(message_id_raw)?;
        self.bot
            .delete_message(ChatId(chat_id), msg_id)
            .await
            .map_err(|err| {
                let description = err.to_string();
                if description.contains("not enough rights")
                    || description.contains("can't be deleted")
                {
                    VezhaError::Permission(format!(
                        "cannot delete message {message_id_raw} in chat {chat_id}: {err}"
                    ))
                } else {
                    VezhaError::Transport {
                        message: format!("failed to delete message: {err}"),
                        source: Some(Box::new(err)),
                    }
                }
            })?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), VezhaError> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .map_err(|err| VezhaError::Transport {
                message: format!("failed to send typing indicator: {err}"),
                source: Some(Box::new(err)),
            })?;
        Ok(())
    }
}

/// Telegram message ids are 32-bit; anything wider is a caller bug.
fn message_id(raw: i64) -> Result<MessageId, VezhaError> {
    i32::try_from(raw)
        .map(MessageId)
        .map_err(|_| VezhaError::Internal(format!("message id {raw} out of Telegram range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_is_a_config_error() {
        let config = TelegramConfig { bot_token: None };
        assert!(matches!(
            TelegramTransport::new(&config),
            Err(VezhaError::Config(_))
        ));
    }

    #[test]
    fn empty_token_is_rejected() {
        let config = TelegramConfig {
            bot_token: Some(String::new()),
        };
        assert!(TelegramTransport::new(&config).is_err());
    }

    #[test]
    fn well_formed_token_is_accepted() {
        let config = TelegramConfig {
            bot_token: Some("110201543:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw".into()),
        };
        assert!(TelegramTransport::new(&config).is_ok());
    }

    #[test]
    fn message_ids_must_fit_the_wire_type() {
        assert_eq!(message_id(42).unwrap(), MessageId(42));
        assert!(message_id(i64::from(i32::MAX) + 1).is_err());
    }
}
