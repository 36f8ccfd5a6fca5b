// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Vezha moderation service.

use thiserror::Error;

/// The primary error type used across Vezha's adapter traits and core operations.
///
/// Moderation is best-effort: callers at suspension points are expected to
/// log these and degrade to "no action" rather than propagate them up to
/// the process boundary.
#[derive(Debug, Error)]
pub enum VezhaError {
    /// Configuration errors (invalid TOML, missing required fields, bad lexicon data).
    #[error("configuration error: {0}")]
    Config(String),

    /// Messaging transport errors (send/edit/delete failure, connection loss, rate limiting).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Model provider errors (API failure, bad status, broken stream).
    #[error("model error: {message}")]
    Model {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The transport rejected an action for lack of rights (delete without admin).
    #[error("permission denied: {0}")]
    Permission(String),

    /// Cache backend errors (serialization failure, poisoned state).
    #[error("cache error: {0}")]
    Cache(String),

    /// An operation ran past its deadline.
    #[error("timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Invariant breaks and other states that indicate a bug.
    #[error("internal error: {0}")]
    Internal(String),
}
