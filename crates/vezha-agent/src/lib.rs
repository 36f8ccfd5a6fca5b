// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event loop for the Vezha chat moderator.
//!
//! The [`AgentService`] is the central coordinator that:
//! - Receives chat events from the transport listener
//! - Answers `/start` and direct questions addressed to the bot
//! - Feeds group messages through the moderation pipeline
//! - Executes verdicts: deletions and streamed rewrites
//! - Handles graceful shutdown

pub mod shutdown;
pub mod streaming;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vezha_core::error::VezhaError;
use vezha_core::traits::chat::ChatTransport;
use vezha_core::traits::model::LanguageModel;
use vezha_core::types::{ChatEvent, EventKind, StoredMessage, Verdict};
use vezha_history::HistoryStore;
use vezha_moderation::{FlightGuard, ModerationPipeline};

use crate::streaming::{attribution_header, StreamingReplier};

/// Reply to the `/start` command.
pub const START_GREETING: &str = "🤖 Бот модератор запущен и готов к работе!";

/// System instruction for direct questions addressed to the bot.
const QUESTION_SYSTEM_PROMPT: &str =
    "Ты вежливый помощник группового чата. Отвечай кратко, по делу и на русском языке.";

/// Sent instead of an answer when the model call fails.
const QUESTION_FALLBACK: &str = "Давайте общаться вежливее.";

/// How long shutdown waits for in-flight moderation runs.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// The main service loop, wiring the chat transport into the moderation
/// pipeline and the model behind it.
///
/// Commands and direct questions are answered off the moderation path;
/// they still land in the history window (except `/start`) but are never
/// moderated. Everything else flows through the [`ModerationPipeline`],
/// and the verdicts it emits are executed against the chat.
pub struct AgentService {
    events: mpsc::Receiver<ChatEvent>,
    transport: Arc<dyn ChatTransport>,
    model: Arc<dyn LanguageModel>,
    pipeline: ModerationPipeline,
    history: Arc<HistoryStore>,
    guard: Arc<FlightGuard>,
    agent_name: String,
}

impl AgentService {
    /// Creates the service over an already-wired pipeline and transport.
    pub fn new(
        events: mpsc::Receiver<ChatEvent>,
        transport: Arc<dyn ChatTransport>,
        model: Arc<dyn LanguageModel>,
        pipeline: ModerationPipeline,
        history: Arc<HistoryStore>,
        guard: Arc<FlightGuard>,
        agent_name: String,
    ) -> Self {
        info!(agent_name = agent_name.as_str(), "agent service initialized");

        Self {
            events,
            transport,
            model,
            pipeline,
            history,
            guard,
            agent_name,
        }
    }

    /// Runs the service until the cancellation token fires or the event
    /// channel closes, then drains in-flight moderation runs.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), VezhaError> {
        info!("agent service running");

        loop {
            tokio::select! {
                maybe_event = self.events.recv() => {
                    match maybe_event {
                        Some(event) => self.handle_event(event).await,
                        None => {
                            info!("event channel closed, stopping agent service");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent service");
                    break;
                }
            }
        }

        shutdown::drain_moderation(&self.guard, DRAIN_TIMEOUT).await;

        info!("agent service stopped");
        Ok(())
    }

    async fn handle_event(&self, event: ChatEvent) {
        match event.kind {
            EventKind::Command => self.handle_command(event).await,
            EventKind::DirectQuestion => {
                let _ = self.spawn_question(event).await;
            }
            EventKind::Text => {
                let _ = self.handle_text(event).await;
            }
        }
    }

    /// `/start` gets a greeting; every other command stays in the history
    /// window and is otherwise ignored.
    async fn handle_command(&self, event: ChatEvent) {
        let command = event
            .text
            .split_whitespace()
            .next()
            .map(|raw| raw.split('@').next().unwrap_or(raw))
            .unwrap_or("");

        if command != "/start" {
            self.history
                .append(event.chat_id, event.history_record())
                .await;
            debug!(chat_id = event.chat_id, command, "ignoring unsupported command");
            return;
        }

        if let Err(err) = self
            .transport
            .reply_text(event.chat_id, event.message_id, START_GREETING)
            .await
        {
            warn!(chat_id = event.chat_id, error = %err, "failed to send start greeting");
        }
    }

    /// Answers a question addressed to the bot, off the moderation path.
    /// The question itself still lands in the history window; the answer
    /// does not.
    async fn spawn_question(&self, event: ChatEvent) -> JoinHandle<()> {
        self.history
            .append(event.chat_id, event.history_record())
            .await;

        let transport = Arc::clone(&self.transport);
        let model = Arc::clone(&self.model);

        tokio::spawn(async move {
            vezha_observe::record_question();

            if let Err(err) = transport.send_typing(event.chat_id).await {
                debug!(chat_id = event.chat_id, error = %err, "failed to send typing action");
            }

            let answer = match model.complete(QUESTION_SYSTEM_PROMPT, &event.text).await {
                Ok(text) => text,
                Err(err) => {
                    warn!(chat_id = event.chat_id, error = %err, "question completion failed");
                    QUESTION_FALLBACK.to_string()
                }
            };

            if let Err(err) = transport
                .reply_text(event.chat_id, event.message_id, &answer)
                .await
            {
                warn!(chat_id = event.chat_id, error = %err, "failed to reply to question");
            }
        })
    }

    /// Feeds a group message into the pipeline and spawns the task that
    /// executes its verdicts.
    async fn handle_text(&self, event: ChatEvent) -> JoinHandle<()> {
        vezha_observe::record_message();

        let chat_id = event.chat_id;
        let message_id = event.message_id;
        let author = event.author_name.clone();
        let mut verdicts = self.pipeline.process(event).await;

        let transport = Arc::clone(&self.transport);
        let history = Arc::clone(&self.history);
        let agent_name = self.agent_name.clone();

        tokio::spawn(async move {
            let started = tokio::time::Instant::now();
            let mut replier: Option<StreamingReplier> = None;

            while let Some(verdict) = verdicts.recv().await {
                match verdict {
                    Verdict::Keep => {}
                    Verdict::Delete(target) => {
                        execute_delete(&transport, &history, chat_id, message_id, target).await;
                    }
                    Verdict::StreamFragment(fragment) => {
                        let active = replier.get_or_insert_with(|| {
                            StreamingReplier::new(
                                Arc::clone(&transport),
                                chat_id,
                                attribution_header(&author),
                            )
                        });
                        active.push(&fragment).await;
                    }
                }
            }

            if let Some(replier) = replier {
                let committed = replier.finalize().await;
                if !committed.is_empty() {
                    vezha_observe::record_rewrite();
                }
                for reply in committed {
                    let record = StoredMessage {
                        id: reply.message_id,
                        text: reply.text,
                        timestamp: chrono::Utc::now().timestamp_millis(),
                        author: agent_name.clone(),
                        history_only: true,
                    };
                    history.append(chat_id, record).await;
                }
            }

            vezha_observe::record_moderation_latency(started.elapsed().as_secs_f64());
        })
    }
}

/// Applies one delete verdict, best-effort.
///
/// A bare delete targets the message that opened the run. A targeted
/// delete names a history message flagged by tone analysis; on success it
/// is also dropped from the recorded window so it cannot be flagged twice.
/// A message the transport refuses to delete stays in the window.
async fn execute_delete(
    transport: &Arc<dyn ChatTransport>,
    history: &Arc<HistoryStore>,
    chat_id: i64,
    event_message_id: i64,
    target: Option<i64>,
) {
    match target {
        None => match transport.delete_message(chat_id, event_message_id).await {
            Ok(()) => vezha_observe::record_deletion("filtered"),
            Err(err) => {
                warn!(
                    chat_id,
                    message_id = event_message_id,
                    error = %err,
                    "failed to delete message, check admin rights"
                );
            }
        },
        Some(id) => match transport.delete_message(chat_id, id).await {
            Ok(()) => {
                history.delete(chat_id, id).await;
                vezha_observe::record_deletion("toxic");
            }
            Err(err) => {
                warn!(
                    chat_id,
                    message_id = id,
                    error = %err,
                    "failed to delete message, check admin rights"
                );
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use vezha_history::{HistoryOptions, MemoryCache};
    use vezha_moderation::{
        CorrectionGenerator, Lexicon, ProfanityFilter, ToneClassifier,
    };
    use vezha_test_utils::events::{command_event, question_event, text_event};
    use vezha_test_utils::{CallKind, MockModel, MockTransport, TransportOp};

    const AGGRESSIVE_REPORT: &str = r#"{"status":"AGGRESSIVE","toxicMessageIds":[2,3]}"#;

    struct Fixture {
        service: AgentService,
        transport: Arc<MockTransport>,
        model: Arc<MockModel>,
        history: Arc<HistoryStore>,
        events: mpsc::Sender<ChatEvent>,
    }

    impl Fixture {
        fn new() -> Self {
            let (events, rx) = mpsc::channel(8);
            let transport = Arc::new(MockTransport::new());
            let model = Arc::new(MockModel::new());
            let history = Arc::new(HistoryStore::new(
                Arc::new(MemoryCache::new()),
                HistoryOptions::default(),
            ));
            let guard = Arc::new(FlightGuard::new());
            let lexicon = Lexicon::embedded().unwrap();
            let pipeline = ModerationPipeline::new(
                Arc::new(ProfanityFilter::new(lexicon)),
                ToneClassifier::new(model.clone()),
                CorrectionGenerator::new(model.clone()),
                Arc::clone(&history),
                Arc::clone(&guard),
            );
            let service = AgentService::new(
                rx,
                transport.clone(),
                model.clone(),
                pipeline,
                Arc::clone(&history),
                guard,
                "vezha".to_string(),
            );

            Self {
                service,
                transport,
                model,
                history,
                events,
            }
        }

        /// Seeds `count` ordinary user messages into the window of `chat_id`.
        async fn seed_history(&self, chat_id: i64, count: i64) {
            for n in 1..=count {
                self.history
                    .append(
                        chat_id,
                        StoredMessage {
                            id: n,
                            text: format!("сообщение номер {n}"),
                            timestamp: 1_700_000_000_000 + n,
                            author: "Оля".to_string(),
                            history_only: false,
                        },
                    )
                    .await;
            }
        }
    }

    #[tokio::test]
    async fn start_command_sends_greeting() {
        let fixture = Fixture::new();

        fixture
            .service
            .handle_command(command_event(5, 1, "/start"))
            .await;

        assert_eq!(
            fixture.transport.operations().await,
            vec![TransportOp::Reply {
                chat_id: 5,
                reply_to: 1,
                text: START_GREETING.to_string(),
            }]
        );

        // Unlike other commands, /start stays out of the window.
        let (window, _) = fixture.history.read(5).await;
        assert!(window.is_empty());
    }

    #[tokio::test]
    async fn start_command_with_bot_suffix_sends_greeting() {
        let fixture = Fixture::new();

        fixture
            .service
            .handle_command(command_event(5, 1, "/start@vezha_bot"))
            .await;

        assert_eq!(fixture.transport.operations().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_command_is_recorded_but_not_answered() {
        let fixture = Fixture::new();

        fixture
            .service
            .handle_command(command_event(5, 1, "/help"))
            .await;

        assert!(fixture.transport.operations().await.is_empty());
        let (window, _) = fixture.history.read(5).await;
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].text, "/help");
    }

    #[tokio::test]
    async fn question_gets_typing_then_reply() {
        let fixture = Fixture::new();
        fixture
            .model
            .queue_complete(Ok("Всё отлично, спасибо!".to_string()))
            .await;

        fixture
            .service
            .spawn_question(question_event(5, 11, "как дела?"))
            .await
            .await
            .unwrap();

        assert_eq!(
            fixture.transport.operations().await,
            vec![
                TransportOp::Typing { chat_id: 5 },
                TransportOp::Reply {
                    chat_id: 5,
                    reply_to: 11,
                    text: "Всё отлично, спасибо!".to_string(),
                },
            ]
        );

        let calls = fixture.model.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, CallKind::Complete);
        assert_eq!(calls[0].system, QUESTION_SYSTEM_PROMPT);
        assert_eq!(calls[0].user, "как дела?");

        // The question lands in the window; the bot's answer does not.
        let (window, _) = fixture.history.read(5).await;
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, 11);
        assert_eq!(window[0].text, "как дела?");
        assert!(!window[0].history_only);
    }

    #[tokio::test]
    async fn question_model_failure_replies_with_fallback() {
        let fixture = Fixture::new();
        fixture
            .model
            .queue_complete(Err(VezhaError::Model {
                message: "status 500".to_string(),
                source: None,
            }))
            .await;

        fixture
            .service
            .spawn_question(question_event(5, 11, "как дела?"))
            .await
            .await
            .unwrap();

        let ops = fixture.transport.operations().await;
        assert_eq!(
            ops[1],
            TransportOp::Reply {
                chat_id: 5,
                reply_to: 11,
                text: QUESTION_FALLBACK.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn clean_message_below_saturation_stays_quiet() {
        let fixture = Fixture::new();
        fixture.seed_history(5, 2).await;

        fixture
            .service
            .handle_text(text_event(5, 3, "обычное сообщение"))
            .await
            .await
            .unwrap();

        assert!(fixture.transport.operations().await.is_empty());
        assert!(fixture.model.calls().await.is_empty());
        let (window, _) = fixture.history.read(5).await;
        assert_eq!(window.len(), 3);
    }

    #[tokio::test]
    async fn profane_message_is_deleted_but_stays_recorded() {
        let fixture = Fixture::new();

        fixture
            .service
            .handle_text(text_event(5, 9, "пошел нахуй"))
            .await
            .await
            .unwrap();

        assert_eq!(
            fixture.transport.operations().await,
            vec![TransportOp::Delete {
                chat_id: 5,
                message_id: 9,
            }]
        );
        // Deleted from the chat, kept in the recorded window.
        let (window, _) = fixture.history.read(5).await;
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn aggressive_history_deletes_then_streams_rewrite() {
        let fixture = Fixture::new();
        fixture.seed_history(5, 6).await;
        fixture.model.queue_structured(Ok(AGGRESSIVE_REPORT.to_string())).await;
        fixture
            .model
            .queue_stream(vec![Ok("Спокойнее".to_string()), Ok(", пожалуйста".to_string())])
            .await;

        fixture
            .service
            .handle_text(text_event(5, 7, "опять ты всё сломал"))
            .await
            .await
            .unwrap();

        let header = "🟣🟣🟣 Оля: \n";
        assert_eq!(
            fixture.transport.operations().await,
            vec![
                TransportOp::Delete { chat_id: 5, message_id: 2 },
                TransportOp::Delete { chat_id: 5, message_id: 3 },
                TransportOp::Send {
                    chat_id: 5,
                    text: format!("{header}\"Спокойнее▌\""),
                },
                TransportOp::Edit {
                    chat_id: 5,
                    message_id: 1000,
                    text: format!("{header}\"Спокойнее, пожалуйста\""),
                },
            ]
        );

        // Flagged messages leave the window; the rewrite enters it as a
        // history-only bot record, newest first.
        let (window, _) = fixture.history.read(5).await;
        let ids: Vec<i64> = window.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1000, 7, 6, 5, 4, 1]);
        let bot_record = &window[0];
        assert_eq!(bot_record.author, "vezha");
        assert!(bot_record.history_only);
        assert_eq!(bot_record.text, format!("{header}\"Спокойнее, пожалуйста\""));
    }

    #[tokio::test(start_paused = true)]
    async fn refused_deletion_keeps_message_in_window() {
        let fixture = Fixture::new();
        fixture.seed_history(5, 6).await;
        fixture.transport.fail_delete_of(2).await;
        fixture.transport.fail_delete_of(3).await;
        fixture.model.queue_structured(Ok(AGGRESSIVE_REPORT.to_string())).await;
        fixture
            .model
            .queue_stream(vec![Ok("Спокойнее".to_string())])
            .await;

        fixture
            .service
            .handle_text(text_event(5, 7, "опять ты всё сломал"))
            .await
            .await
            .unwrap();

        // Deletions were refused, the rewrite still went out.
        assert!(fixture.transport.deleted_message_ids().await.is_empty());
        let (window, _) = fixture.history.read(5).await;
        let ids: Vec<i64> = window.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1000, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_loop_handles_events_until_cancelled() {
        let Fixture {
            mut service,
            transport,
            events,
            ..
        } = Fixture::new();
        let cancel = CancellationToken::new();

        let run_cancel = cancel.clone();
        let run = tokio::spawn(async move { service.run(run_cancel).await });

        events.send(command_event(5, 1, "/start")).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if !transport.operations().await.is_empty() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("greeting was not sent");

        cancel.cancel();
        run.await.unwrap().unwrap();
    }
}
