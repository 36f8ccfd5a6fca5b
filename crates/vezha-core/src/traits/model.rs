// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language-model seam (DeepSeek in production).

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::VezhaError;

/// Lazy sequence of generated text fragments, in generation order.
///
/// The sequence is finite and not restartable; a transport failure surfaces
/// as one terminal `Err` item. Dropping the stream cancels generation.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, VezhaError>> + Send>>;

/// Adapter for the external language model.
///
/// Two one-shot call shapes plus a streaming shape; every call carries a
/// system instruction and one user message.
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// One-shot plain-text completion.
    async fn complete(&self, system: &str, user: &str) -> Result<String, VezhaError>;

    /// One-shot completion constrained to a strict JSON object payload.
    /// Returns the raw object text; the caller owns deserialization.
    async fn complete_structured(&self, system: &str, user: &str)
        -> Result<String, VezhaError>;

    /// Streaming completion.
    async fn stream(&self, system: &str, user: &str) -> Result<FragmentStream, VezhaError>;
}
