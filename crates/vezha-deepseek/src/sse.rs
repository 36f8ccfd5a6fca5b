// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE parser for DeepSeek streaming responses.
//!
//! Converts a reqwest response byte stream into a stream of text fragments
//! using the `eventsource-stream` crate for SSE protocol compliance. The
//! stream ends at the `[DONE]` sentinel; chunks with no text (role-only
//! openers, finish markers) and chunks that fail to parse are skipped.

use eventsource_stream::Eventsource;
use futures::future;
use futures::stream::StreamExt;
use tracing::debug;

use vezha_core::{FragmentStream, VezhaError};

use crate::types::StreamChunk;

/// Sentinel data payload that closes a chat-completions stream.
const DONE_SENTINEL: &str = "[DONE]";

enum SseItem {
    Fragment(String),
    Skip,
    Done,
    Error(VezhaError),
}

/// Parses a streaming response body into ordered text fragments.
///
/// Transport failures mid-stream surface as one terminal `Err` item;
/// everything the server sends after `[DONE]` is ignored.
pub fn parse_fragment_stream(response: reqwest::Response) -> FragmentStream {
    let event_stream = response.bytes_stream().eventsource();

    let mapped = event_stream
        .map(|result| match result {
            Ok(event) => {
                if event.data.trim() == DONE_SENTINEL {
                    return SseItem::Done;
                }
                match serde_json::from_str::<StreamChunk>(&event.data) {
                    Ok(chunk) => match chunk.fragment() {
                        Some(text) => SseItem::Fragment(text),
                        None => SseItem::Skip,
                    },
                    Err(e) => {
                        debug!(error = %e, "skipping malformed stream chunk");
                        SseItem::Skip
                    }
                }
            }
            Err(e) => SseItem::Error(VezhaError::Transport {
                message: format!("SSE transport failed mid-stream: {e}"),
                source: Some(Box::new(e)),
            }),
        })
        .take_while(|item| future::ready(!matches!(item, SseItem::Done)))
        .filter_map(|item| {
            future::ready(match item {
                SseItem::Fragment(text) => Some(Ok(text)),
                SseItem::Error(e) => Some(Err(e)),
                SseItem::Skip | SseItem::Done => None,
            })
        });

    Box::pin(mapped)
}
