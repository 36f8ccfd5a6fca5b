// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Vezha moderation bot.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Vezha workspace. The transport, model,
//! and cache adapters all implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::VezhaError;
pub use types::{ChatEvent, EventKind, StoredMessage, Tone, ToneReport, Verdict};

// Re-export the adapter traits at crate root.
pub use traits::{Cache, ChatTransport, FragmentStream, LanguageModel};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vezha_error_has_all_variants() {
        // Verify all 7 error variants exist and can be constructed.
        let _config = VezhaError::Config("test".into());
        let _transport = VezhaError::Transport {
            message: "test".into(),
            source: None,
        };
        let _model = VezhaError::Model {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _permission = VezhaError::Permission("test".into());
        let _cache = VezhaError::Cache("test".into());
        let _timeout = VezhaError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = VezhaError::Internal("test".into());
    }

    #[test]
    fn error_display_includes_message() {
        let err = VezhaError::Transport {
            message: "rate limited".into(),
            source: None,
        };
        assert_eq!(err.to_string(), "transport error: rate limited");

        let err = VezhaError::Permission("chat -100".into());
        assert_eq!(err.to_string(), "permission denied: chat -100");
    }

    #[test]
    fn all_trait_seams_are_exported() {
        // Compile-time check that the three adapter seams are accessible
        // through the public API.
        fn _assert_cache<T: Cache>() {}
        fn _assert_transport<T: ChatTransport>() {}
        fn _assert_model<T: LanguageModel>() {}
    }
}
