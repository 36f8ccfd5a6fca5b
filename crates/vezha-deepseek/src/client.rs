// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the DeepSeek chat-completions API.
//!
//! [`DeepSeekClient`] owns request construction and bearer auth, opens
//! SSE streams, and retries transient statuses.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use vezha_core::{FragmentStream, VezhaError};

use crate::sse;
use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// Completions endpoint path, joined onto the configured base URL.
const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// HTTP client for DeepSeek API communication.
///
/// Owns the pooled connection and bearer-auth headers, and retries
/// transient statuses (429, 500, 503) with a short pause.
#[derive(Debug, Clone)]
pub struct DeepSeekClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
}

impl DeepSeekClient {
    /// Creates a new DeepSeek API client.
    ///
    /// # Arguments
    /// * `api_key` - DeepSeek API key for bearer authentication
    /// * `base_url` - API origin (e.g., "https://api.deepseek.com")
    /// * `timeout` - Budget for one whole exchange, stream body included
    /// * `max_retries` - Extra attempts after a transient failure
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, VezhaError> {
        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| VezhaError::Config(format!("invalid API key header value: {e}")))?;
        authorization.set_sensitive(true);
        headers.insert("authorization", authorization);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| VezhaError::Transport {
                message: format!("could not construct HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}{COMPLETIONS_PATH}", base_url.trim_end_matches('/')),
            max_retries,
        })
    }

    /// Performs one buffered chat completion and parses the response.
    ///
    /// On transient errors (429, 500, 503), retries after a 1-second delay.
    pub async fn complete_chat(&self, request: &ChatRequest) -> Result<ChatResponse, VezhaError> {
        let mut req = request.clone();
        req.stream = false;

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "completion attempt retried after transient status");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(&req)
                .send()
                .await
                .map_err(|e| VezhaError::Transport {
                    message: format!("request to DeepSeek failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response arrived");

            if status.is_success() {
                let body = response.text().await.map_err(|e| VezhaError::Transport {
                    message: format!("could not read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let chat_response: ChatResponse =
                    serde_json::from_str(&body).map_err(|e| VezhaError::Model {
                        message: format!("malformed completion payload: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(chat_response);
            }

            if is_retryable(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient status, retrying");
                last_error = Some(api_error(status, &body));
                continue;
            }

            // Permanent status, or the last allowed attempt.
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        Err(last_error.unwrap_or_else(|| VezhaError::Model {
            message: "no completion after exhausting retries".into(),
            source: None,
        }))
    }

    /// Sends a streaming request and returns a stream of text fragments.
    ///
    /// Retry applies only to the initial response status; once the stream
    /// has opened, a mid-stream failure ends it with one `Err` item.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<FragmentStream, VezhaError> {
        let mut req = request.clone();
        req.stream = true;

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "stream open retried after transient status");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(&req)
                .send()
                .await
                .map_err(|e| VezhaError::Transport {
                    message: format!("request to DeepSeek failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "stream response arrived");

            if status.is_success() {
                return Ok(sse::parse_fragment_stream(response));
            }

            if is_retryable(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient status, retrying");
                last_error = Some(api_error(status, &body));
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        Err(last_error.unwrap_or_else(|| VezhaError::Model {
            message: "no stream after exhausting retries".into(),
            source: None,
        }))
    }
}

/// Shapes a non-2xx response into a [`VezhaError::Model`], decoding the
/// API error envelope when the body carries one.
fn api_error(status: reqwest::StatusCode, body: &str) -> VezhaError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(body) {
        format!(
            "DeepSeek API error ({}): {}",
            api_err.error.type_, api_err.error.message
        )
    } else {
        format!("API returned {status}: {body}")
    };
    VezhaError::Model {
        message,
        source: None,
    }
}

/// Status codes worth another attempt: DeepSeek rate limiting and
/// server-side overload.
fn is_retryable(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
