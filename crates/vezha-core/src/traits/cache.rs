// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value cache seam backing the history store.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::VezhaError;

/// Best-effort TTL cache over string keys and opaque serialized values.
///
/// A `get` miss is indistinguishable from an expired or never-written key;
/// callers must treat both as an empty window, never as an error.
#[async_trait]
pub trait Cache: Send + Sync + 'static {
    /// Returns the value under `key`, or `None` on miss/expiry.
    async fn get(&self, key: &str) -> Result<Option<String>, VezhaError>;

    /// Stores `value` under `key` for `ttl`, replacing any previous value
    /// and restarting its clock.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), VezhaError>;

    /// Drops `key` if present.
    async fn remove(&self, key: &str) -> Result<(), VezhaError>;
}
