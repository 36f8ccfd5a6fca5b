// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! DeepSeek chat-completions request/response types and stream chunk types.
//!
//! The API speaks the OpenAI-compatible `/v1/chat/completions` dialect.

use serde::{Deserialize, Serialize};

// --- Request types ---

/// A request to the DeepSeek chat-completions API.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "deepseek-chat").
    pub model: String,

    /// Conversation messages, system instruction first.
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature. Omitted for the provider default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Output format constraint. `json_object` forces a strict JSON reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    /// Whether to stream the response as SSE chunks.
    pub stream: bool,
}

/// A single message in the chat-completions conversation format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user" or "assistant".
    pub role: String,
    /// Plain text content.
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Output format constraint for a request.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    /// Format type (e.g., "json_object").
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    /// Constrains the model to emit one valid JSON object.
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

// --- Response types ---

/// A full response from the chat-completions API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Identifier DeepSeek assigned to this completion.
    pub id: String,
    /// Model that produced the completion.
    pub model: String,
    /// Generated choices; the first one carries the reply.
    pub choices: Vec<ChatChoice>,
    /// Token accounting, absent on streamed chunks.
    #[serde(default)]
    pub usage: Option<ApiUsage>,
}

impl ChatResponse {
    /// Text of the first choice, if the response carries one.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// One generated alternative in a response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// Position of this choice.
    pub index: u32,
    /// The generated message.
    pub message: ChatMessage,
    /// Why generation ended (`stop`, `length`, ...).
    pub finish_reason: Option<String>,
}

/// Prompt and completion token counts as billed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the reply.
    pub completion_tokens: u32,
    /// Total tokens billed.
    pub total_tokens: u32,
}

// --- Streaming chunk types ---

/// One SSE data payload from a streaming response.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChunk {
    /// Incremental choices; the first one carries the delta.
    pub choices: Vec<StreamChoice>,
}

impl StreamChunk {
    /// Non-empty text carried by this chunk's first delta, if any.
    pub fn fragment(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|text| !text.is_empty())
    }
}

/// One incremental choice within a stream chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    /// The incremental update.
    pub delta: StreamDelta,
    /// Set on the final content chunk.
    pub finish_reason: Option<String>,
}

/// Incremental message content. The opening chunk carries only a role.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

// --- Error types ---

/// Error envelope returned by the API on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Details of an API error.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable description.
    pub message: String,
    /// Error class (e.g., "invalid_request_error").
    #[serde(rename = "type", default)]
    pub type_: String,
}
