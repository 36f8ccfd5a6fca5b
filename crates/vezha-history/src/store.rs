// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded per-chat history window over the cache seam.
//!
//! Each chat owns one window of at most `capacity` messages, stored as a
//! single serialized value under the chat's key and refreshed with the
//! configured TTL on every write -- the window lives and dies as a unit.
//! All access to one chat's window is serialized through a per-key async
//! mutex, so a racing record and delete cannot lose updates.
//!
//! The store is best-effort by contract: a cache miss, an expired window,
//! and a corrupt payload all read as an empty conversation and are never
//! surfaced as errors.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::warn;

use vezha_core::{Cache, StoredMessage};

/// Tuning for one [`HistoryStore`].
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// Maximum messages retained per chat.
    pub capacity: usize,
    /// Lifetime of a chat's whole window.
    pub ttl: Duration,
    /// Fullness ratio above which the window counts as saturated.
    pub saturation_threshold: f64,
    /// Window within which an identical repeated message counts as spam.
    pub repeat_window: Duration,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            capacity: 10,
            ttl: Duration::from_secs(86_400),
            saturation_threshold: 0.5,
            repeat_window: Duration::from_secs(180),
        }
    }
}

/// Bounded, TTL-backed conversation log.
pub struct HistoryStore {
    cache: Arc<dyn Cache>,
    options: HistoryOptions,
    key_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl HistoryStore {
    pub fn new(cache: Arc<dyn Cache>, options: HistoryOptions) -> Self {
        Self {
            cache,
            options,
            key_locks: DashMap::new(),
        }
    }

    /// Inserts `message` at the logical head of the chat's window.
    ///
    /// The window is re-sorted newest-first by timestamp, trimmed to
    /// capacity, and rewritten under a fresh TTL. Returns the stored record.
    pub async fn append(&self, chat_id: i64, message: StoredMessage) -> StoredMessage {
        let _guard = self.lock_key(chat_id).await;
        let key = history_key(chat_id);

        let mut window = self.read_window(&key).await;
        window.insert(0, message.clone());
        // Stable sort keeps the fresh insert ahead of equal timestamps.
        window.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        window.truncate(self.options.capacity);

        self.write_window(&key, &window).await;
        message
    }

    /// Returns the chat's current window (newest first) and its saturation
    /// flag. A miss reads as an empty, unsaturated conversation.
    pub async fn read(&self, chat_id: i64) -> (Vec<StoredMessage>, bool) {
        let _guard = self.lock_key(chat_id).await;
        let window = self.read_window(&history_key(chat_id)).await;
        let saturated = self.is_saturated(window.len());
        (window, saturated)
    }

    /// Removes and returns the record with `message_id`, rewriting the
    /// window. A second delete of the same id is a no-op.
    pub async fn delete(&self, chat_id: i64, message_id: i64) -> Option<StoredMessage> {
        let _guard = self.lock_key(chat_id).await;
        let key = history_key(chat_id);

        let mut window = self.read_window(&key).await;
        let position = window.iter().position(|m| m.id == message_id)?;
        let removed = window.remove(position);

        self.write_window(&key, &window).await;
        Some(removed)
    }

    /// Formats the window oldest-first for the tone classifier, one line per
    /// message, together with the saturation flag.
    pub async fn render(&self, chat_id: i64) -> (String, bool) {
        let _guard = self.lock_key(chat_id).await;
        let mut window = self.read_window(&history_key(chat_id)).await;
        let saturated = self.is_saturated(window.len());

        window.sort_by_key(|m| m.timestamp);
        let text = window
            .iter()
            .map(format_line)
            .collect::<Vec<_>>()
            .join("\n");
        (text, saturated)
    }

    /// True when `text` is byte-identical to the author's previous message
    /// within the repeat window.
    pub async fn is_repeat(&self, chat_id: i64, author_id: i64, text: &str) -> bool {
        match self.cache.get(&last_message_key(chat_id, author_id)).await {
            Ok(Some(previous)) => previous == text,
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, chat_id, "repeat lookup failed, assuming not spam");
                false
            }
        }
    }

    /// Records `text` as the author's most recent message for repeat
    /// detection.
    pub async fn note_last(&self, chat_id: i64, author_id: i64, text: &str) {
        let key = last_message_key(chat_id, author_id);
        if let Err(e) = self
            .cache
            .set(&key, text.to_string(), self.options.repeat_window)
            .await
        {
            warn!(error = %e, chat_id, "failed to record last message");
        }
    }

    fn is_saturated(&self, len: usize) -> bool {
        len as f64 / self.options.capacity as f64 > self.options.saturation_threshold
    }

    async fn lock_key(&self, chat_id: i64) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = self.key_locks.entry(chat_id).or_default().clone();
        lock.lock_owned().await
    }

    async fn read_window(&self, key: &str) -> Vec<StoredMessage> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, key, "history read failed, treating as empty");
                return Vec::new();
            }
        };

        match raw {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!(error = %e, key, "corrupt history window dropped");
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    async fn write_window(&self, key: &str, window: &[StoredMessage]) {
        let json = match serde_json::to_string(window) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, key, "failed to encode history window");
                return;
            }
        };
        if let Err(e) = self.cache.set(key, json, self.options.ttl).await {
            warn!(error = %e, key, "history write failed");
        }
    }
}

fn history_key(chat_id: i64) -> String {
    format!("{chat_id}_chat_history")
}

fn last_message_key(chat_id: i64, author_id: i64) -> String {
    format!("{chat_id}-{author_id}-last")
}

fn format_line(m: &StoredMessage) -> String {
    format!(
        "[ID: {}, User: {}, Timestamp: {}, historyOnly: {}]: {}",
        m.id, m.author, m.timestamp, m.history_only, m.text
    )
}
