//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! - the AI proxy used by default
//! - OpenAI itself
//! - vLLM, LocalAI, llama-server, text-generation-inference
//!
//! The endpoint is the full `/chat/completions` URL, not a base URL, since
//! proxies mount the API under arbitrary prefixes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::AIBackend;

/// OpenAI-compatible backend
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAICompatibleBackend {
    /// Create a backend for `endpoint` with default sampling settings
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self::from_config(&LlmConfig {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            ..LlmConfig::default()
        })
    }

    /// Create from the LLM section of the application config
    pub fn from_config(config: &LlmConfig) -> Self {
        if config.api_key.is_none() {
            warn!(
                endpoint = %config.endpoint,
                "AIPROXY_TOKEN is not set; LLM fallback requests will be unauthenticated"
            );
        }
        Self {
            http_client: Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout,
        }
    }

    /// Make a chat completion request
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(format!(
                    "LLM endpoint did not respond within {}s",
                    self.timeout.as_secs()
                ))
            } else {
                Error::Http(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "LLM API error {}: {}",
                status,
                body.trim()
            )));
        }

        let body = response.text().await?;
        let chat_response: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            Error::UnexpectedResponse(format!("LLM response is not a chat completion: {}", e))
        })?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedResponse("LLM response has no choices".into()))?;

        choice
            .message
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| {
                Error::UnexpectedResponse("LLM response choice has no message content".into())
            })
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// Chat completion choice
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

/// Chat response message
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            user_chars = user.len(),
            "Sending chat completion"
        );
        self.chat_completion(vec![
            ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user.to_string(),
            },
        ])
        .await
    }

    fn name(&self) -> &'static str {
        "openai_compatible"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockChatServer, MockReply};

    fn backend_for(server: &MockChatServer) -> OpenAICompatibleBackend {
        OpenAICompatibleBackend::from_config(&LlmConfig {
            endpoint: server.chat_url(),
            api_key: Some("test-token".into()),
            ..LlmConfig::default()
        })
    }

    #[tokio::test]
    async fn test_complete_returns_trimmed_content() {
        let server = MockChatServer::start_with(MockReply::Content("  42 \n".into())).await;
        let reply = backend_for(&server).complete("sys", "user").await.unwrap();
        assert_eq!(reply, "42");
    }

    #[tokio::test]
    async fn test_request_shape() {
        let server = MockChatServer::start().await;
        backend_for(&server)
            .complete("Answer only.", "Question: 1+1?")
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let body = &requests[0];
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 150);
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Answer only.");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Question: 1+1?");
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_error() {
        let server = MockChatServer::start_with(MockReply::Status(500)).await;
        let err = backend_for(&server).complete("s", "u").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_missing_choices_is_unexpected_response() {
        let server = MockChatServer::start_with(MockReply::NoChoices).await;
        let err = backend_for(&server).complete("s", "u").await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn test_non_chat_body_is_unexpected_response() {
        let server = MockChatServer::start().await;
        let backend = OpenAICompatibleBackend::new(&format!("{}/text", server.url()), "m");
        // GET-only route, so POST gets a 405
        let err = backend.complete("s", "u").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));

        let backend = OpenAICompatibleBackend::new(&format!("{}/json", server.url()), "m");
        let err = backend.complete("s", "u").await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse(_)));
    }
}
