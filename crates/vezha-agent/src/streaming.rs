// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Edit-in-place delivery of rewritten messages.
//!
//! A rewrite streams out of the model fragment by fragment. The replier
//! posts one silent placeholder as soon as the first fragment arrives,
//! then keeps editing that message as the text grows, throttled to stay
//! under Telegram rate limits. Overlong rewrites are split at paragraph
//! boundaries into follow-up messages.

use std::sync::Arc;

use tokio::time::{Duration, Instant};
use tracing::warn;

use vezha_core::traits::chat::ChatTransport;

/// Minimum interval between edits of the in-progress message.
const EDIT_THROTTLE: Duration = Duration::from_millis(1500);

/// Leave margin below Telegram's 4096 limit for escaping overhead.
const SPLIT_THRESHOLD: usize = 3800;

/// Appended to the in-progress text so readers see generation is live.
const STREAM_CURSOR: char = '▌';

/// A delivered message the replier has finished editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedReply {
    /// Message id assigned by the transport.
    pub message_id: i64,
    /// Final rendered text, attribution line included.
    pub text: String,
}

/// Streams a rewrite into the chat in the moderator voice.
///
/// Delivery is best-effort throughout: a failed send leaves the
/// placeholder for the next flush to retry, and a failed edit keeps the
/// previous text on screen. [`finalize`](Self::finalize) must be called
/// after the last fragment to strip the cursor and collect the results.
pub struct StreamingReplier {
    transport: Arc<dyn ChatTransport>,
    chat_id: i64,
    header: String,
    buffer: String,
    message_id: Option<i64>,
    committed: Vec<CommittedReply>,
    last_edit: Instant,
}

impl StreamingReplier {
    /// Creates a replier for one rewrite in `chat_id`. `header` is the
    /// attribution line, see [`attribution_header`].
    pub fn new(transport: Arc<dyn ChatTransport>, chat_id: i64, header: String) -> Self {
        Self {
            transport,
            chat_id,
            header,
            buffer: String::new(),
            message_id: None,
            committed: Vec::new(),
            last_edit: Instant::now() - EDIT_THROTTLE, // Allow immediate first send
        }
    }

    /// Appends a fragment and pushes the accumulated text to the chat
    /// when the throttle allows.
    pub async fn push(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);

        if self.rendered_chars() > SPLIT_THRESHOLD {
            self.split_overflow().await;
        }

        if self.last_edit.elapsed() >= EDIT_THROTTLE {
            self.flush(true).await;
        }
    }

    /// Delivers the final text without the cursor and returns every
    /// message this rewrite produced, in posting order.
    pub async fn finalize(mut self) -> Vec<CommittedReply> {
        self.commit_current().await;
        self.committed
    }

    /// Finalizes the current message with the head of an overlong buffer
    /// and carries the tail over into a fresh message.
    async fn split_overflow(&mut self) {
        let reserved = self.header.chars().count() + 2;
        let budget = SPLIT_THRESHOLD.saturating_sub(reserved);
        let (head, tail) = split_before(&self.buffer, budget);
        let head = head.to_string();
        let tail = tail.to_string();

        self.buffer = head;
        self.commit_current().await;
        self.buffer = tail;
    }

    /// Flushes the buffer in its final form and records the message id.
    /// Makes one last send attempt when no placeholder exists yet.
    async fn commit_current(&mut self) {
        if self.buffer.is_empty() && self.message_id.is_none() {
            return;
        }

        self.flush(false).await;

        if let Some(id) = self.message_id.take() {
            self.committed.push(CommittedReply {
                message_id: id,
                text: self.render(false),
            });
        }
        self.buffer.clear();
    }

    /// Sends or edits the chat message with the current buffer.
    async fn flush(&mut self, cursor: bool) {
        let display = self.render(cursor);

        match self.message_id {
            None => match self.transport.send_text(self.chat_id, &display).await {
                Ok(id) => {
                    self.message_id = Some(id);
                    self.last_edit = Instant::now();
                }
                Err(err) => {
                    warn!(chat_id = self.chat_id, error = %err, "failed to send streamed reply");
                }
            },
            Some(id) => match self.transport.edit_text(self.chat_id, id, &display).await {
                Ok(()) => self.last_edit = Instant::now(),
                Err(err) => {
                    warn!(
                        chat_id = self.chat_id,
                        message_id = id,
                        error = %err,
                        "failed to edit streamed reply"
                    );
                }
            },
        }
    }

    fn render(&self, cursor: bool) -> String {
        if cursor {
            format!("{}\"{}{STREAM_CURSOR}\"", self.header, self.buffer)
        } else {
            format!("{}\"{}\"", self.header, self.buffer)
        }
    }

    fn rendered_chars(&self) -> usize {
        // Quotes around the body; the cursor fits inside the margin.
        self.header.chars().count() + self.buffer.chars().count() + 2
    }
}

/// Colorized attribution line prepended to every reposted rewrite.
// TODO: make the prefix colors configurable
pub fn attribution_header(author: &str) -> String {
    let prefix = if author.starts_with('V') {
        "🔵🔵🔵"
    } else {
        "🟣🟣🟣"
    };
    format!("{prefix} {author}: \n")
}

/// Splits text before `max_chars`, preferring a paragraph boundary.
///
/// Falls back from double newline to single newline to space, and only
/// then cuts mid-word.
pub fn split_before(text: &str, max_chars: usize) -> (&str, &str) {
    if text.chars().count() <= max_chars {
        return (text, "");
    }

    let limit = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(at, _)| at);
    let region = &text[..limit];

    if let Some(pos) = region.rfind("\n\n") {
        return (&text[..pos], text[pos + 2..].trim_start());
    }

    if let Some(pos) = region.rfind('\n') {
        return (&text[..pos], text[pos + 1..].trim_start());
    }

    if let Some(pos) = region.rfind(' ') {
        return (&text[..pos], &text[pos + 1..]);
    }

    (&text[..limit], &text[limit..])
}
