// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the moderation core and its external collaborators.
//!
//! All traits use `#[async_trait]` so they can be held as trait objects by
//! the agent loop and replaced by mocks in tests.

pub mod cache;
pub mod chat;
pub mod model;

pub use cache::Cache;
pub use chat::ChatTransport;
pub use model::{FragmentStream, LanguageModel};
