// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vezha serve` command implementation.
//!
//! Starts the full moderation daemon: the Telegram long-poll listener, the
//! per-chat history window, the DeepSeek-backed moderation pipeline, and the
//! agent service that executes verdicts. Supports graceful shutdown via
//! signal handlers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use vezha_agent::shutdown;
use vezha_agent::AgentService;
use vezha_config::VezhaConfig;
use vezha_core::error::VezhaError;
use vezha_core::{Cache, ChatEvent, ChatTransport, LanguageModel};
use vezha_deepseek::DeepSeekModel;
use vezha_history::{HistoryOptions, HistoryStore, MemoryCache};
use vezha_moderation::{
    CorrectionGenerator, FlightGuard, Lexicon, ModerationPipeline, ProfanityFilter, ToneClassifier,
};
use vezha_observe::{HealthState, PrometheusRecorder};
use vezha_telegram::{TelegramTransport, UpdateListener};

/// Runs the `vezha serve` command.
pub async fn run_serve(config: VezhaConfig) -> Result<(), VezhaError> {
    // Tracing subscriber before any other setup.
    init_tracing(&config.agent.log_level);

    info!("starting vezha serve");

    // Per-chat history window over the in-process cache.
    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    let history = Arc::new(HistoryStore::new(
        cache,
        HistoryOptions {
            capacity: config.history.capacity,
            ttl: Duration::from_secs(config.history.ttl_secs),
            saturation_threshold: config.history.saturation_threshold,
            repeat_window: Duration::from_secs(config.moderation.repeat_window_secs),
        },
    ));
    info!(
        capacity = config.history.capacity,
        ttl_secs = config.history.ttl_secs,
        "history store initialized"
    );

    // Initialize DeepSeek provider.
    let model: Arc<dyn LanguageModel> = {
        let provider = DeepSeekModel::new(&config).map_err(|e| {
            error!(error = %e, "failed to initialize DeepSeek provider");
            eprintln!(
                "error: DeepSeek API key required. Set deepseek.api_key in vezha.toml or \
                 export VEZHA_DEEPSEEK_API_KEY"
            );
            e
        })?;
        Arc::new(provider)
    };

    // Moderation pipeline: lexicon override or the embedded word lists.
    let lexicon = Lexicon::load(config.moderation.lexicon_path.as_deref().map(Path::new))?;
    let guard = Arc::new(FlightGuard::new());
    let pipeline = ModerationPipeline::new(
        Arc::new(ProfanityFilter::new(lexicon)),
        ToneClassifier::new(Arc::clone(&model)),
        CorrectionGenerator::new(Arc::clone(&model)),
        Arc::clone(&history),
        Arc::clone(&guard),
    );

    // Initialize Telegram transport.
    let transport = TelegramTransport::new(&config.telegram).map_err(|e| {
        error!(error = %e, "failed to initialize Telegram transport");
        eprintln!(
            "error: Telegram bot token required. Set telegram.bot_token in vezha.toml or \
             export VEZHA_TELEGRAM_BOT_TOKEN"
        );
        e
    })?;
    let bot = transport.bot().clone();
    let transport: Arc<dyn ChatTransport> = Arc::new(transport);

    // One token fans shutdown out to every background task.
    let cancel = shutdown::cancel_on_signal();

    // Initialize Prometheus metrics and the health listener (if enabled).
    if config.health.enabled {
        let recorder = match PrometheusRecorder::install() {
            Ok(recorder) => Some(recorder),
            Err(e) => {
                warn!(error = %e, "metrics recorder did not install, continuing without it");
                None
            }
        };
        let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
            recorder.as_ref().map(|recorder| {
                let handle = recorder.handle().clone();
                Arc::new(move || handle.render()) as Arc<dyn Fn() -> String + Send + Sync>
            });
        let state = HealthState {
            start_time: std::time::Instant::now(),
            prometheus_render,
        };
        let host = config.health.host.clone();
        let port = config.health.port;
        let health_cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = vezha_observe::start_server(&host, port, state, health_cancel).await {
                error!(error = %e, "health listener failed");
            }
        });
        info!(
            host = config.health.host.as_str(),
            port = config.health.port,
            "health listener started"
        );
    } else {
        debug!("health listener disabled by configuration");
    }

    // Spawn the in-flight gauge sampler.
    {
        let sampler_guard = Arc::clone(&guard);
        let sampler_cancel = cancel.clone();
        tokio::spawn(async move {
            in_flight_sampler(sampler_guard, sampler_cancel).await;
        });
    }

    // Start the Telegram long-poll listener. When it exits, the sender side
    // of the event channel drops and the agent loop drains to completion.
    let (events_tx, events_rx) = mpsc::channel::<ChatEvent>(256);
    let listener = UpdateListener::new(bot, events_tx);
    tokio::spawn(async move {
        if let Err(e) = listener.run().await {
            error!(error = %e, "telegram listener exited with error");
        }
    });
    info!("telegram listener started");

    // Create and run the agent service.
    let mut service = AgentService::new(
        events_rx,
        transport,
        model,
        pipeline,
        history,
        guard,
        config.agent.name.clone(),
    );

    service.run(cancel).await?;

    info!("vezha serve shutdown complete");
    Ok(())
}

/// Background task that exports the number of moderation runs currently in
/// flight as a Prometheus gauge every 5 seconds.
async fn in_flight_sampler(guard: Arc<FlightGuard>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                vezha_observe::set_moderations_in_flight(guard.in_flight() as f64);
            }
            _ = cancel.cancelled() => {
                info!("in-flight sampler shutting down");
                break;
            }
        }
    }
}

/// Sets up the tracing subscriber. `RUST_LOG` still wins over the
/// configured level when present.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vezha={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
