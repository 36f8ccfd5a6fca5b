// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Vezha metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("vezha_messages_total", "Total text messages observed");
    describe_counter!(
        "vezha_deletions_total",
        "Messages deleted by the moderator"
    );
    describe_counter!(
        "vezha_rewrites_total",
        "Aggressive messages rewritten and reposted"
    );
    describe_counter!("vezha_questions_total", "Direct questions answered");
    describe_gauge!(
        "vezha_moderations_in_flight",
        "Chats with an active moderation run"
    );
    describe_histogram!(
        "vezha_moderation_seconds",
        "Wall-clock duration of a full moderation run"
    );
}

/// Record an observed text message.
pub fn record_message() {
    metrics::counter!("vezha_messages_total").increment(1);
}

/// Record a deleted message. `reason` is either `filtered` (the triggering
/// message failed a fast check) or `toxic` (flagged by tone analysis).
pub fn record_deletion(reason: &str) {
    metrics::counter!("vezha_deletions_total", "reason" => reason.to_string()).increment(1);
}

/// Record a completed rewrite reposted in the moderator voice.
pub fn record_rewrite() {
    metrics::counter!("vezha_rewrites_total").increment(1);
}

/// Record an answered direct question.
pub fn record_question() {
    metrics::counter!("vezha_questions_total").increment(1);
}

/// Set the number of chats with a moderation run in flight.
pub fn set_moderations_in_flight(count: f64) {
    metrics::gauge!("vezha_moderations_in_flight").set(count);
}

/// Record how long a moderation run took, end to end.
pub fn record_moderation_latency(seconds: f64) {
    metrics::histogram!("vezha_moderation_seconds").record(seconds);
}
