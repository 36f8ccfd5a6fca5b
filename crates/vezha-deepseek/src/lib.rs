// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! DeepSeek provider adapter for the vezha moderation agent.
//!
//! This crate implements [`LanguageModel`] over the DeepSeek
//! chat-completions API, providing single-shot completion, JSON-constrained
//! completion for the tone classifier, and streaming SSE responses for the
//! correction flow.

pub mod client;
pub mod sse;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use vezha_config::VezhaConfig;
use vezha_core::{FragmentStream, LanguageModel, VezhaError};

use crate::client::DeepSeekClient;
use crate::types::{ChatMessage, ChatRequest, ResponseFormat};

/// Sampling temperature for JSON-constrained calls. Low on purpose: the
/// classifier must produce the same verdict for the same history.
const STRUCTURED_TEMPERATURE: f32 = 0.2;

/// DeepSeek chat-completions provider implementing [`LanguageModel`].
#[derive(Debug)]
pub struct DeepSeekModel {
    client: DeepSeekClient,
    model: String,
}

impl DeepSeekModel {
    /// Creates a provider from the loaded configuration.
    ///
    /// Requires `deepseek.api_key`; validation reports its absence before
    /// this runs, so the check here only guards direct construction.
    pub fn new(config: &VezhaConfig) -> Result<Self, VezhaError> {
        let api_key = config.deepseek.api_key.as_deref().ok_or_else(|| {
            VezhaError::Config(
                "deepseek.api_key is not set; add it to vezha.toml or export VEZHA_DEEPSEEK_API_KEY"
                    .to_string(),
            )
        })?;

        let client = DeepSeekClient::new(
            api_key,
            &config.deepseek.base_url,
            Duration::from_secs(config.deepseek.request_timeout_secs),
            config.deepseek.max_retries,
        )?;

        info!(model = config.deepseek.model, "DeepSeek provider initialized");

        Ok(Self {
            client,
            model: config.deepseek.model.clone(),
        })
    }

    fn chat_request(&self, system: &str, user: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: None,
            response_format: None,
            stream: false,
        }
    }
}

#[async_trait]
impl LanguageModel for DeepSeekModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, VezhaError> {
        let request = self.chat_request(system, user);
        let response = self.client.complete_chat(&request).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| VezhaError::Model {
                message: "response contained no choices".to_string(),
                source: None,
            })
    }

    async fn complete_structured(&self, system: &str, user: &str) -> Result<String, VezhaError> {
        let mut request = self.chat_request(system, user);
        request.temperature = Some(STRUCTURED_TEMPERATURE);
        request.response_format = Some(ResponseFormat::json_object());

        let response = self.client.complete_chat(&request).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| VezhaError::Model {
                message: "response contained no choices".to_string(),
                source: None,
            })
    }

    async fn stream(&self, system: &str, user: &str) -> Result<FragmentStream, VezhaError> {
        let request = self.chat_request(system, user);
        self.client.stream_chat(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_model(base_url: &str) -> DeepSeekModel {
        let mut config = VezhaConfig::default();
        config.deepseek.api_key = Some("test-api-key".into());
        config.deepseek.base_url = base_url.to_string();
        DeepSeekModel::new(&config).unwrap()
    }

    fn success_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "model": "deepseek-chat",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
            ]
        })
    }

    #[test]
    fn new_requires_an_api_key() {
        let config = VezhaConfig::default();
        let err = DeepSeekModel::new(&config).unwrap_err().to_string();
        assert!(err.contains("deepseek.api_key"), "got: {err}");
    }

    #[tokio::test]
    async fn complete_sends_system_then_user() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-chat",
                "messages": [
                    {"role": "system", "content": "Ты модератор."},
                    {"role": "user", "content": "привет"}
                ],
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("Здравствуйте!")))
            .expect(1)
            .mount(&server)
            .await;

        let model = test_model(&server.uri());
        let reply = model.complete("Ты модератор.", "привет").await.unwrap();
        assert_eq!(reply, "Здравствуйте!");
    }

    #[tokio::test]
    async fn structured_call_constrains_format_and_temperature() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "temperature": 0.2,
                "response_format": {"type": "json_object"}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body(r#"{"status":"NEUTRAL","toxicMessageIds":[]}"#)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let model = test_model(&server.uri());
        let raw = model
            .complete_structured("Определи тон.", "история")
            .await
            .unwrap();
        assert!(raw.contains("NEUTRAL"));
    }

    #[tokio::test]
    async fn plain_call_carries_no_format_constraint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ответ")))
            .mount(&server)
            .await;

        let model = test_model(&server.uri());
        model.complete("s", "u").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("temperature").is_none());
        assert!(body.get("response_format").is_none());
    }

    #[tokio::test]
    async fn empty_choices_surface_as_model_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-empty",
                "model": "deepseek-chat",
                "choices": []
            })))
            .mount(&server)
            .await;

        let model = test_model(&server.uri());
        let err = model.complete("s", "u").await.unwrap_err().to_string();
        assert!(err.contains("no choices"), "got: {err}");
    }

    #[tokio::test]
    async fn stream_yields_fragments_through_the_trait() {
        let server = MockServer::start().await;

        let sse = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"},\"finish_reason\":null}]}\n\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"Будьте \"},\"finish_reason\":null}]}\n\n\
                   data: {\"choices\":[{\"delta\":{\"content\":\"добрее\"},\"finish_reason\":null}]}\n\n\
                   data: [DONE]\n\n";

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let model = test_model(&server.uri());
        let stream = model.stream("s", "u").await.unwrap();
        let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;
        assert_eq!(fragments, vec!["Будьте ", "добрее"]);
    }
}
