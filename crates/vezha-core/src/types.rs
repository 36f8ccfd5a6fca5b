// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Vezha workspace.

use serde::{Deserialize, Serialize};

/// A chat message as kept in the bounded per-conversation history window.
///
/// Serialized with serde_json when the window is written to the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Telegram message id, unique within its chat.
    pub id: i64,
    pub text: String,
    /// Epoch milliseconds at the time the message was recorded.
    pub timestamp: i64,
    pub author: String,
    /// Marks a record that exists only as model context (e.g. a committed
    /// correction that replaced a deleted message). Such records are never
    /// re-moderated and never deleted from the chat again.
    #[serde(default)]
    pub history_only: bool,
}

/// Classification of an inbound update, decided by the transport listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Regular chat text, subject to moderation.
    Text,
    /// Bot command (leading `/`); never moderated.
    Command,
    /// Private-chat message or @mention of the bot; answered, not moderated.
    DirectQuestion,
}

/// One inbound chat event as handed to the agent loop.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub chat_id: i64,
    pub message_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub text: String,
    pub timestamp_ms: i64,
    pub kind: EventKind,
}

impl ChatEvent {
    /// The history record this event produces when it is written to the window.
    pub fn history_record(&self) -> StoredMessage {
        StoredMessage {
            id: self.message_id,
            text: self.text.clone(),
            timestamp: self.timestamp_ms,
            author: self.author_name.clone(),
            history_only: false,
        }
    }
}

/// Conversation tone as reported by the classifier.
///
/// The serialized names are the wire contract with the model's structured
/// output; anything outside these four fails deserialization and is treated
/// as an absent report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Tone {
    Aggressive,
    Neutral,
    Thankful,
    Sexual,
}

/// Structured verdict of one classifier call over a rendered history window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneReport {
    pub status: Tone,
    /// Ids of messages the model flagged as toxic, drawn from the rendered window.
    #[serde(default)]
    pub toxic_message_ids: Vec<i64>,
}

/// Outcome items produced lazily by one moderation run.
///
/// A run yields zero or more `Delete` verdicts, then either a single `Keep`
/// or a sequence of `StreamFragment`s carrying the polite rewrite; completion
/// is observed as exhaustion of the verdict channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Delete a message. `None` refers to the message that triggered the run.
    Delete(Option<i64>),
    /// No action.
    Keep,
    /// One fragment of the streamed polite rewrite.
    StreamFragment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_report_parses_wire_shape() {
        let report: ToneReport =
            serde_json::from_str(r#"{"status":"AGGRESSIVE","toxicMessageIds":[101,102]}"#)
                .expect("wire shape should parse");
        assert_eq!(report.status, Tone::Aggressive);
        assert_eq!(report.toxic_message_ids, vec![101, 102]);
    }

    #[test]
    fn tone_report_ids_default_to_empty() {
        let report: ToneReport =
            serde_json::from_str(r#"{"status":"NEUTRAL"}"#).expect("ids are optional");
        assert_eq!(report.status, Tone::Neutral);
        assert!(report.toxic_message_ids.is_empty());
    }

    #[test]
    fn unknown_tone_is_rejected() {
        let result = serde_json::from_str::<ToneReport>(r#"{"status":"ANGRY"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn tone_display_matches_wire_names() {
        assert_eq!(Tone::Aggressive.to_string(), "AGGRESSIVE");
        assert_eq!(Tone::Thankful.to_string(), "THANKFUL");
    }

    #[test]
    fn stored_message_history_only_defaults_false() {
        let msg: StoredMessage = serde_json::from_str(
            r#"{"id":1,"text":"привет","timestamp":1700000000000,"author":"Оля"}"#,
        )
        .expect("history_only is optional");
        assert!(!msg.history_only);
    }

    #[test]
    fn event_produces_live_history_record() {
        let event = ChatEvent {
            chat_id: -100,
            message_id: 7,
            author_id: 42,
            author_name: "Оля".into(),
            text: "всем привет".into(),
            timestamp_ms: 1_700_000_000_000,
            kind: EventKind::Text,
        };
        let record = event.history_record();
        assert_eq!(record.id, 7);
        assert_eq!(record.author, "Оля");
        assert!(!record.history_only);
    }
}
