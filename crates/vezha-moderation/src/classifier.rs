// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation tone classifier.
//!
//! Sends the rendered history window to the model under a strict JSON
//! contract and deserializes the verdict. Every failure mode -- call
//! error, malformed JSON, a status outside the contract -- degrades to
//! "no report", which callers must treat as a clean conversation.

use std::sync::Arc;

use tracing::warn;

use vezha_core::traits::model::LanguageModel;
use vezha_core::types::ToneReport;

/// System prompt for the tone analysis call. The line format mirrors
/// what the history store renders, and the JSON shape mirrors
/// [`ToneReport`].
const ANALYZE_SYSTEM_PROMPT: &str = r#"Ты модератор русскоязычного группового чата. Тебе передают последние сообщения чата, по одному в строке, в формате:

[ID: <id сообщения>, User: <имя автора>, Timestamp: <время>, historyOnly: <true|false>]: <текст>

Оцени общий тон переписки, обращая особое внимание на последние сообщения, и перечисли токсичные сообщения. Сообщения с historyOnly: true написаны самим ботом и даны только для контекста: их нельзя указывать в toxicMessageIds.

Ответь строго одним JSON-объектом без пояснений и без markdown:
{"status": "AGGRESSIVE" | "NEUTRAL" | "THANKFUL" | "SEXUAL", "toxicMessageIds": [<ID токсичных сообщений>]}

Если токсичных сообщений нет, верни пустой массив toxicMessageIds."#;

/// Model-backed tone analysis over a rendered history window.
#[derive(Clone)]
pub struct ToneClassifier {
    model: Arc<dyn LanguageModel>,
}

impl ToneClassifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Classifies the rendered history window.
    ///
    /// Returns `None` when the call fails or the reply does not parse.
    /// The caller treats an absent report as a clean conversation; a
    /// broken classifier must never delete messages.
    pub async fn classify(&self, history: &str) -> Option<ToneReport> {
        let user = format!("История сообщений:\n{history}");
        let raw = match self
            .model
            .complete_structured(ANALYZE_SYSTEM_PROMPT, &user)
            .await
        {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "tone analysis call failed");
                return None;
            }
        };

        match serde_json::from_str::<ToneReport>(&raw) {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(error = %err, "tone analysis returned malformed JSON");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use vezha_core::error::VezhaError;
    use vezha_core::types::Tone;
    use vezha_test_utils::{CallKind, MockModel};

    use super::*;

    fn classifier() -> (Arc<MockModel>, ToneClassifier) {
        let model = Arc::new(MockModel::new());
        (model.clone(), ToneClassifier::new(model))
    }

    #[tokio::test]
    async fn parses_an_aggressive_report() {
        let (model, classifier) = classifier();
        model
            .queue_structured(Ok(
                r#"{"status":"AGGRESSIVE","toxicMessageIds":[3,5]}"#.to_string()
            ))
            .await;

        let report = classifier.classify("[ID: 3 ...]").await.unwrap();
        assert_eq!(report.status, Tone::Aggressive);
        assert_eq!(report.toxic_message_ids, vec![3, 5]);
    }

    #[tokio::test]
    async fn missing_toxic_ids_default_to_empty() {
        let (model, classifier) = classifier();
        model
            .queue_structured(Ok(r#"{"status":"THANKFUL"}"#.to_string()))
            .await;

        let report = classifier.classify("history").await.unwrap();
        assert_eq!(report.status, Tone::Thankful);
        assert!(report.toxic_message_ids.is_empty());
    }

    #[tokio::test]
    async fn call_failure_yields_no_report() {
        let (model, classifier) = classifier();
        model
            .queue_structured(Err(VezhaError::Model {
                message: "api down".to_string(),
                source: None,
            }))
            .await;

        assert!(classifier.classify("history").await.is_none());
    }

    #[tokio::test]
    async fn malformed_json_yields_no_report() {
        let (model, classifier) = classifier();
        model
            .queue_structured(Ok("ну тут все агрессивные".to_string()))
            .await;

        assert!(classifier.classify("history").await.is_none());
    }

    #[tokio::test]
    async fn unknown_status_yields_no_report() {
        let (model, classifier) = classifier();
        model
            .queue_structured(Ok(
                r#"{"status":"FURIOUS","toxicMessageIds":[]}"#.to_string()
            ))
            .await;

        assert!(classifier.classify("history").await.is_none());
    }

    #[tokio::test]
    async fn history_is_passed_in_the_user_message() {
        let (model, classifier) = classifier();
        let history = "[ID: 1, User: Оля, Timestamp: 5, historyOnly: false]: привет";
        classifier.classify(history).await;

        let calls = model.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, CallKind::Structured);
        assert!(calls[0].user.starts_with("История сообщений:\n"));
        assert!(calls[0].user.contains(history));
        assert!(calls[0].system.contains("toxicMessageIds"));
    }
}
