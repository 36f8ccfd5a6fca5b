// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process TTL cache.
//!
//! The production backing for the [`Cache`] seam: a map of string keys to
//! serialized values with per-entry deadlines. Expiry is lazy -- an expired
//! entry is dropped when it is next read, which keeps reads and writes
//! lock-cheap and needs no sweeper task.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use vezha_core::{Cache, VezhaError};

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-memory [`Cache`] implementation.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CacheEntry>>, VezhaError> {
        self.entries
            .lock()
            .map_err(|_| VezhaError::Cache("cache mutex poisoned".to_string()))
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, VezhaError> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), VezhaError> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), VezhaError> {
        let mut entries = self.lock()?;
        entries.remove(key);
        Ok(())
    }
}
