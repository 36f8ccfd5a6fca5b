// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moderation engine for the Vezha agent.
//!
//! The pipeline watches a group chat and moves every message through a
//! fixed sequence: record to the history window, per-chat single-flight,
//! repeat-message spam check, lexical profanity filter, saturation
//! check, model tone analysis, and the aggression flow that replaces
//! toxic exchanges with a polite rewrite.
//!
//! # Components
//!
//! - [`Lexicon`] - Validated word lists, embedded or loaded from a file
//! - [`ProfanityFilter`] - Homoglyph-aware lexical filter
//! - [`ToneClassifier`] - Structured tone analysis over the history window
//! - [`CorrectionGenerator`] - Streamed polite rewrite of flagged messages
//! - [`FlightGuard`] - Per-chat single-flight permits
//! - [`ModerationPipeline`] - The orchestrating state machine

pub mod classifier;
pub mod corrector;
pub mod filter;
pub mod guard;
pub mod lexicon;
pub mod pipeline;

pub use classifier::ToneClassifier;
pub use corrector::CorrectionGenerator;
pub use filter::ProfanityFilter;
pub use guard::{FlightGuard, FlightPermit};
pub use lexicon::Lexicon;
pub use pipeline::ModerationPipeline;
