// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shutdown plumbing.
//!
//! SIGTERM and SIGINT (Ctrl+C) cancel a [`CancellationToken`] watched by
//! the service loop, which then drains in-flight moderation runs before
//! the process exits.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vezha_moderation::FlightGuard;

/// Returns a [`CancellationToken`] cancelled by SIGTERM or SIGINT.
///
/// The watcher task runs in the background until the first signal lands.
pub fn cancel_on_signal() -> CancellationToken {
    let token = CancellationToken::new();
    let handler = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("SIGTERM handler registration failed");

            tokio::select! {
                _ = ctrl_c => {
                    info!("SIGINT received, shutting down");
                }
                _ = sigterm.recv() => {
                    info!("SIGTERM received, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("Ctrl+C received, shutting down");
        }

        handler.cancel();
        debug!("signal handler task exiting");
    });

    token
}

/// Waits up to `timeout` for in-flight moderation runs to finish.
///
/// Runs past the timeout are interrupted: their verdict tasks are still
/// spawned on the runtime and die with the process.
pub async fn drain_moderation(guard: &FlightGuard, timeout: Duration) {
    let active = guard.in_flight();
    if active == 0 {
        info!("no moderation runs to drain");
        return;
    }

    info!(count = active, "waiting for moderation runs to complete");

    let deadline = tokio::time::Instant::now() + timeout;
    while guard.in_flight() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let remaining = guard.in_flight();
    if remaining == 0 {
        info!("all moderation runs drained");
    } else {
        warn!(remaining, "timeout reached, some moderation runs interrupted");
    }
}
