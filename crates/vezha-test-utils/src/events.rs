// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for the chat events used across integration tests.

use vezha_core::types::{ChatEvent, EventKind};

/// Base timestamp; the message id is added as an offset so events built
/// with increasing ids also carry increasing timestamps.
const BASE_TIMESTAMP_MS: i64 = 1_700_000_000_000;

/// A plain group-chat message from a default author.
pub fn text_event(chat_id: i64, message_id: i64, text: &str) -> ChatEvent {
    authored_event(chat_id, message_id, 42, "Оля", text)
}

/// A plain group-chat message with an explicit author.
pub fn authored_event(
    chat_id: i64,
    message_id: i64,
    author_id: i64,
    author_name: &str,
    text: &str,
) -> ChatEvent {
    ChatEvent {
        chat_id,
        message_id,
        author_id,
        author_name: author_name.to_string(),
        text: text.to_string(),
        timestamp_ms: BASE_TIMESTAMP_MS + message_id,
        kind: EventKind::Text,
    }
}

/// A slash command such as "/start".
pub fn command_event(chat_id: i64, message_id: i64, command: &str) -> ChatEvent {
    ChatEvent {
        kind: EventKind::Command,
        ..authored_event(chat_id, message_id, 42, "Оля", command)
    }
}

/// A question addressed directly to the bot, mention already stripped.
pub fn question_event(chat_id: i64, message_id: i64, text: &str) -> ChatEvent {
    ChatEvent {
        kind: EventKind::DirectQuestion,
        ..authored_event(chat_id, message_id, 42, "Оля", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_the_builder() {
        assert_eq!(text_event(1, 1, "привет").kind, EventKind::Text);
        assert_eq!(command_event(1, 1, "/start").kind, EventKind::Command);
        assert_eq!(question_event(1, 1, "кто ты?").kind, EventKind::DirectQuestion);
    }

    #[test]
    fn later_ids_carry_later_timestamps() {
        let a = text_event(1, 10, "первое");
        let b = text_event(1, 11, "второе");
        assert!(a.timestamp_ms < b.timestamp_ms);
    }
}
