// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update intake and event classification.
//!
//! Long-polls Telegram and turns each text message into a [`ChatEvent`]
//! for the agent loop: a slash command, a question addressed to the bot
//! (private chat or @mention, with the mention stripped), or a plain
//! group message headed for moderation. Non-text updates are dropped.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ChatKind;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use vezha_core::error::VezhaError;
use vezha_core::types::{ChatEvent, EventKind};

/// Classifies one Telegram message into a chat event.
///
/// Returns `None` for non-text messages and for messages without a
/// sender (channel posts). A bare mention with nothing else in it falls
/// back to a plain text event, keeping the original text.
pub fn classify_message(msg: &Message, bot_username: &str) -> Option<ChatEvent> {
    let text = msg.text()?;
    let user = msg.from.as_ref()?;

    let author_name = if user.first_name.is_empty() {
        user.username
            .clone()
            .unwrap_or_else(|| "unknown".to_string())
    } else {
        user.first_name.clone()
    };

    let base = ChatEvent {
        chat_id: msg.chat.id.0,
        message_id: i64::from(msg.id.0),
        author_id: user.id.0 as i64,
        author_name,
        text: text.to_string(),
        timestamp_ms: msg.date.timestamp_millis(),
        kind: EventKind::Text,
    };

    if text.starts_with('/') {
        return Some(ChatEvent {
            kind: EventKind::Command,
            ..base
        });
    }

    let mention = format!("@{bot_username}");
    if is_private(msg) || text.contains(&mention) {
        let stripped = text.replace(&mention, "").trim().to_string();
        if !stripped.is_empty() {
            return Some(ChatEvent {
                kind: EventKind::DirectQuestion,
                text: stripped,
                ..base
            });
        }
    }

    Some(base)
}

fn is_private(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Long-polling update listener feeding the agent's event channel.
pub struct UpdateListener {
    bot: Bot,
    events: mpsc::Sender<ChatEvent>,
}

impl UpdateListener {
    pub fn new(bot: Bot, events: mpsc::Sender<ChatEvent>) -> Self {
        Self { bot, events }
    }

    /// Resolves the bot's username, then dispatches updates until the
    /// surrounding task is cancelled.
    pub async fn run(self) -> Result<(), VezhaError> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|err| VezhaError::Transport {
                message: format!("cannot resolve bot identity: {err}"),
                source: Some(Box::new(err)),
            })?;
        let username: Arc<str> = Arc::from(me.username());
        info!(bot = %username, "telegram long polling started");

        let events = self.events.clone();
        let handler = Update::filter_message().endpoint(move |msg: Message| {
            let events = events.clone();
            let username = Arc::clone(&username);
            async move {
                match classify_message(&msg, &username) {
                    Some(event) => {
                        if events.send(event).await.is_err() {
                            warn!("event channel closed, dropping update");
                        }
                    }
                    None => {
                        debug!(msg_id = msg.id.0, "ignoring non-text update");
                    }
                }
                respond(())
            }
        });

        Dispatcher::builder(self.bot, handler)
            .default_handler(|_| async {}) // Silently ignore non-message updates
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: &str = "vezha_bot";

    fn message(chat: serde_json::Value, from: serde_json::Value, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 17,
            "date": 1_700_000_000i64,
            "chat": chat,
            "from": from,
            "text": text,
        });
        serde_json::from_value(json).expect("mock message should deserialize")
    }

    fn group_message(text: &str) -> Message {
        message(
            serde_json::json!({
                "id": -100123i64,
                "type": "supergroup",
                "title": "Тестовый чат",
            }),
            serde_json::json!({
                "id": 12345u64,
                "is_bot": false,
                "first_name": "Вера",
            }),
            text,
        )
    }

    fn private_message(text: &str) -> Message {
        message(
            serde_json::json!({
                "id": 12345i64,
                "type": "private",
                "first_name": "Вера",
            }),
            serde_json::json!({
                "id": 12345u64,
                "is_bot": false,
                "first_name": "Вера",
            }),
            text,
        )
    }

    #[test]
    fn group_text_maps_every_field() {
        let event = classify_message(&group_message("привет всем"), BOT).unwrap();
        assert_eq!(event.kind, EventKind::Text);
        assert_eq!(event.chat_id, -100123);
        assert_eq!(event.message_id, 17);
        assert_eq!(event.author_id, 12345);
        assert_eq!(event.author_name, "Вера");
        assert_eq!(event.text, "привет всем");
        assert_eq!(event.timestamp_ms, 1_700_000_000_000);
    }

    #[test]
    fn slash_commands_are_commands_everywhere() {
        let event = classify_message(&group_message("/start"), BOT).unwrap();
        assert_eq!(event.kind, EventKind::Command);
        assert_eq!(event.text, "/start");

        let event = classify_message(&private_message("/start"), BOT).unwrap();
        assert_eq!(event.kind, EventKind::Command);
    }

    #[test]
    fn private_chat_is_a_direct_question() {
        let event = classify_message(&private_message("как дела?"), BOT).unwrap();
        assert_eq!(event.kind, EventKind::DirectQuestion);
        assert_eq!(event.text, "как дела?");
    }

    #[test]
    fn mention_is_stripped_from_the_question() {
        let event =
            classify_message(&group_message("@vezha_bot кто тут главный?"), BOT).unwrap();
        assert_eq!(event.kind, EventKind::DirectQuestion);
        assert_eq!(event.text, "кто тут главный?");
    }

    #[test]
    fn bare_mention_falls_back_to_plain_text() {
        let event = classify_message(&group_message("@vezha_bot"), BOT).unwrap();
        assert_eq!(event.kind, EventKind::Text);
        assert_eq!(event.text, "@vezha_bot");
    }

    #[test]
    fn other_mentions_are_plain_text() {
        let event = classify_message(&group_message("@other_bot привет"), BOT).unwrap();
        assert_eq!(event.kind, EventKind::Text);
    }

    #[test]
    fn missing_sender_is_ignored() {
        let json = serde_json::json!({
            "message_id": 17,
            "date": 1_700_000_000i64,
            "chat": {
                "id": -100123i64,
                "type": "supergroup",
                "title": "Тестовый чат",
            },
            "text": "пост канала",
        });
        let msg: Message = serde_json::from_value(json).unwrap();
        assert!(classify_message(&msg, BOT).is_none());
    }

    #[test]
    fn empty_first_name_falls_back_to_username() {
        let msg = message(
            serde_json::json!({
                "id": -100123i64,
                "type": "supergroup",
                "title": "Тестовый чат",
            }),
            serde_json::json!({
                "id": 9u64,
                "is_bot": false,
                "first_name": "",
                "username": "olya",
            }),
            "привет",
        );
        let event = classify_message(&msg, BOT).unwrap();
        assert_eq!(event.author_name, "olya");
    }
}
