//! Pluggable chat-completion backend for the LLM fallback
//!
//! # Architecture
//!
//! - `AIBackend` trait: a single-turn chat completion
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (openai_compatible, mock). Default: openai_compatible
//!
//! Endpoint, key, model, and timeout come from [`LlmConfig`].

mod mock;
mod openai_compatible;

pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::error::Result;

/// Trait defining the interface for all chat backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send a system instruction plus user content; return the reply text
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Model identifier sent with requests
    fn model(&self) -> &str;
}

/// Concrete AI client wrapping one of the backends
#[derive(Clone)]
pub enum AIClient {
    /// Any server implementing `/v1/chat/completions`
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from `AI_BACKEND` and the LLM settings
    pub fn from_env(config: &LlmConfig) -> Self {
        let backend = std::env::var("AI_BACKEND").unwrap_or_default();
        Self::from_backend_name(&backend, config)
    }

    /// Create an AI client by backend name
    ///
    /// - `openai_compatible` (default, also `openai` or empty)
    /// - `mock`
    pub fn from_backend_name(backend: &str, config: &LlmConfig) -> Self {
        match backend.trim().to_lowercase().as_str() {
            "" | "openai_compatible" | "openai" => {
                AIClient::OpenAICompatible(OpenAICompatibleBackend::from_config(config))
            }
            "mock" => AIClient::Mock(MockBackend::new()),
            other => {
                tracing::warn!(backend = %other, "Unknown AI_BACKEND, using openai_compatible");
                AIClient::OpenAICompatible(OpenAICompatibleBackend::from_config(config))
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        match self {
            AIClient::OpenAICompatible(b) => b.complete(system, user).await,
            AIClient::Mock(b) => b.complete(system, user).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AIClient::OpenAICompatible(b) => b.name(),
            AIClient::Mock(b) => b.name(),
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }
}
