// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation memory for vezha.
//!
//! Pairs an in-process TTL cache with a bounded per-chat history window.
//! The store is what the moderation pipeline talks to; the cache behind it
//! is swappable through the [`vezha_core::Cache`] seam.

pub mod cache;
pub mod store;

pub use cache::MemoryCache;
pub use store::{HistoryOptions, HistoryStore};
