// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Vezha integration tests.
//!
//! Provides mock adapters and event builders for fast, deterministic,
//! CI-runnable tests without Telegram or the DeepSeek API.
//!
//! # Components
//!
//! - [`MockModel`] - Mock language model with pre-configured responses
//! - [`MockTransport`] - Mock chat transport with operation capture and
//!   scripted failures
//! - [`events`] - Builders for the chat events tests feed the pipeline

pub mod events;
pub mod mock_model;
pub mod mock_transport;

pub use mock_model::{CallKind, MockModel, RecordedCall, NEUTRAL_REPORT};
pub use mock_transport::{MockTransport, TransportOp};
