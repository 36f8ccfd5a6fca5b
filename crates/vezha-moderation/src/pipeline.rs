// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The moderation pipeline.
//!
//! Every inbound group message is first recorded to the chat's history
//! window, then moderated through a fixed sequence of stages: a per-chat
//! single-flight check, a repeat-message check, the lexical profanity
//! filter, a window saturation check, model tone analysis, and finally
//! the aggression flow that deletes toxic messages and streams a polite
//! rewrite.
//!
//! Verdicts are produced lazily into a bounded channel; the consumer
//! drives the pipeline by draining it, and channel exhaustion marks the
//! run complete. A message that arrives while its chat already has a run
//! in flight is recorded but never moderated.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use vezha_core::types::{ChatEvent, Tone, Verdict};
use vezha_history::HistoryStore;

use crate::classifier::ToneClassifier;
use crate::corrector::CorrectionGenerator;
use crate::filter::ProfanityFilter;
use crate::guard::FlightGuard;

/// Verdict channel depth. Consumers drain promptly; the buffer only has
/// to absorb a burst of delete verdicts ahead of the stream.
const VERDICT_BUFFER: usize = 16;

/// Orchestrates one moderation run per inbound message.
#[derive(Clone)]
pub struct ModerationPipeline {
    filter: Arc<ProfanityFilter>,
    classifier: ToneClassifier,
    corrector: CorrectionGenerator,
    history: Arc<HistoryStore>,
    guard: Arc<FlightGuard>,
}

impl ModerationPipeline {
    pub fn new(
        filter: Arc<ProfanityFilter>,
        classifier: ToneClassifier,
        corrector: CorrectionGenerator,
        history: Arc<HistoryStore>,
        guard: Arc<FlightGuard>,
    ) -> Self {
        Self {
            filter,
            classifier,
            corrector,
            history,
            guard,
        }
    }

    /// Records `event` and starts a moderation run for it.
    ///
    /// Returns the verdict channel for this run. The channel closing
    /// means the run is complete; a channel that closes without yielding
    /// any verdict means the message was recorded but not moderated.
    pub async fn process(&self, event: ChatEvent) -> mpsc::Receiver<Verdict> {
        let (tx, rx) = mpsc::channel(VERDICT_BUFFER);

        // Every message lands in the window, whatever happens to it next.
        self.history
            .append(event.chat_id, event.history_record())
            .await;

        let Some(permit) = self.guard.try_acquire(event.chat_id) else {
            info!(
                chat_id = event.chat_id,
                message_id = event.message_id,
                "moderation already in flight, message recorded only"
            );
            return rx;
        };

        let pipeline = self.clone();
        tokio::spawn(async move {
            let _permit = permit;
            pipeline.run(event, tx).await;
        });

        rx
    }

    async fn run(&self, event: ChatEvent, tx: mpsc::Sender<Verdict>) {
        let chat_id = event.chat_id;

        // Repeat check reads the author's previous message before the
        // note refreshes it, so a repeated repeat stays flagged.
        let repeat = self
            .history
            .is_repeat(chat_id, event.author_id, &event.text)
            .await;
        self.history
            .note_last(chat_id, event.author_id, &event.text)
            .await;
        if repeat {
            warn!(
                chat_id,
                author = %event.author_name,
                "repeated message treated as spam"
            );
            let _ = tx.send(Verdict::Delete(None)).await;
            return;
        }

        if self.filter.is_profane(&event.text) {
            warn!(
                chat_id,
                message_id = event.message_id,
                "profanity filter matched"
            );
            let _ = tx.send(Verdict::Delete(None)).await;
            return;
        }

        let (rendered, saturated) = self.history.render(chat_id).await;
        if !saturated {
            debug!(chat_id, "history window below saturation, keeping");
            let _ = tx.send(Verdict::Keep).await;
            return;
        }

        let Some(report) = self.classifier.classify(&rendered).await else {
            let _ = tx.send(Verdict::Keep).await;
            return;
        };
        info!(
            chat_id,
            status = %report.status,
            toxic = report.toxic_message_ids.len(),
            "tone analysis complete"
        );

        if report.status != Tone::Aggressive {
            let _ = tx.send(Verdict::Keep).await;
            return;
        }

        for id in &report.toxic_message_ids {
            if tx.send(Verdict::Delete(Some(*id))).await.is_err() {
                return;
            }
        }

        let mut fragments = match self.corrector.rewrite(&report, &event.text).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(chat_id, error = %err, "correction stream failed to start");
                return;
            }
        };
        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    if tx.send(Verdict::StreamFragment(fragment)).await.is_err() {
                        return;
                    }
                }
                Err(err) => {
                    warn!(chat_id, error = %err, "correction stream broke mid-way");
                    return;
                }
            }
        }
    }
}
