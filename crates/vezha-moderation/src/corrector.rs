// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming polite-rewrite generation for the aggression flow.

use std::sync::Arc;

use vezha_core::error::VezhaError;
use vezha_core::traits::model::{FragmentStream, LanguageModel};
use vezha_core::types::{Tone, ToneReport};

/// How a tone reads inside the rewrite prompt.
fn tone_description(tone: Tone) -> &'static str {
    match tone {
        Tone::Aggressive => "агрессивные",
        Tone::Sexual => "непристойные",
        Tone::Thankful => "благодарные",
        Tone::Neutral => "нейтральные",
    }
}

/// Builds the system prompt for one rewrite call.
fn correction_prompt(report: &ToneReport) -> String {
    format!(
        "Ты модератор группового чата. Последние сообщения в чате расценены как {}.\n\
         Перепиши сообщение пользователя вежливо и спокойно:\n\
         - сохрани смысл и детали исходного сообщения;\n\
         - пиши от лица автора;\n\
         - не добавляй приветствий, пояснений и извинений;\n\
         - ответь только переписанным текстом на русском языке.",
        tone_description(report.status)
    )
}

/// Streams polite rewrites of flagged messages.
#[derive(Clone)]
pub struct CorrectionGenerator {
    model: Arc<dyn LanguageModel>,
}

impl CorrectionGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Starts a streamed rewrite of `text` under the tone in `report`.
    pub async fn rewrite(
        &self,
        report: &ToneReport,
        text: &str,
    ) -> Result<FragmentStream, VezhaError> {
        self.model.stream(&correction_prompt(report), text).await
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use vezha_test_utils::{CallKind, MockModel};

    use super::*;

    fn report(status: Tone) -> ToneReport {
        ToneReport {
            status,
            toxic_message_ids: vec![],
        }
    }

    #[tokio::test]
    async fn fragments_pass_through_in_order() {
        let model = Arc::new(MockModel::new());
        model
            .queue_stream(vec![Ok("Будьте ".to_string()), Ok("добрее".to_string())])
            .await;
        let corrector = CorrectionGenerator::new(model);

        let mut stream = corrector
            .rewrite(&report(Tone::Aggressive), "иди ты")
            .await
            .unwrap();
        let mut rewritten = String::new();
        while let Some(fragment) = stream.next().await {
            rewritten.push_str(&fragment.unwrap());
        }
        assert_eq!(rewritten, "Будьте добрее");
    }

    #[tokio::test]
    async fn prompt_names_the_tone_and_carries_the_text() {
        let model = Arc::new(MockModel::new());
        let corrector = CorrectionGenerator::new(model.clone());

        corrector
            .rewrite(&report(Tone::Aggressive), "исходный текст")
            .await
            .unwrap();

        let calls = model.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, CallKind::Stream);
        assert!(calls[0].system.contains("агрессивные"));
        assert_eq!(calls[0].user, "исходный текст");
    }

    #[test]
    fn every_tone_has_a_description() {
        for (tone, description) in [
            (Tone::Aggressive, "агрессивные"),
            (Tone::Sexual, "непристойные"),
            (Tone::Thankful, "благодарные"),
            (Tone::Neutral, "нейтральные"),
        ] {
            assert!(correction_prompt(&report(tone)).contains(description));
        }
    }

    #[tokio::test]
    async fn stream_errors_surface_as_items() {
        let model = Arc::new(MockModel::new());
        model
            .queue_stream(vec![
                Ok("начало".to_string()),
                Err(VezhaError::Transport {
                    message: "connection reset".to_string(),
                    source: None,
                }),
            ])
            .await;
        let corrector = CorrectionGenerator::new(model);

        let mut stream = corrector
            .rewrite(&report(Tone::Aggressive), "текст")
            .await
            .unwrap();
        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }
}
