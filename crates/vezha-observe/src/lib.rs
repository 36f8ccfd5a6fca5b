// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observability for the Vezha moderator: Prometheus metrics plus the
//! health/metrics HTTP listener.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Collected
//! metrics are rendered in Prometheus text format through the listener's
//! /metrics route.

pub mod recording;
pub mod server;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use vezha_core::error::VezhaError;

pub use recording::{
    record_deletion, record_message, record_moderation_latency, record_question, record_rewrite,
    set_moderations_in_flight,
};
pub use server::{start_server, HealthState};

/// Installed Prometheus recorder.
///
/// Holds the handle used to render collected metrics. Only one recorder
/// can be installed per process; a second install fails.
pub struct PrometheusRecorder {
    handle: PrometheusHandle,
}

impl PrometheusRecorder {
    /// Install the Prometheus recorder globally and register metric
    /// descriptions.
    pub fn install() -> Result<Self, VezhaError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            VezhaError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Reference to the handle for rendering.
    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // install() is exercised in one place only: the recorder is global to
    // the process, so a second test installing it would fail.
    #[test]
    fn install_records_and_renders() {
        let recorder = PrometheusRecorder::install().unwrap();
        recording::record_message();
        recording::record_deletion("filtered");
        recording::set_moderations_in_flight(2.0);

        let rendered = recorder.render();
        assert!(rendered.contains("vezha_messages_total"));
        assert!(rendered.contains("vezha_deletions_total"));
        assert!(rendered.contains("reason=\"filtered\""));
        assert!(rendered.contains("vezha_moderations_in_flight"));
    }
}
