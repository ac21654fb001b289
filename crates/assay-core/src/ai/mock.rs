//! Mock backend for testing
//!
//! Returns a fixed answer (or a fixed failure) and records every prompt it
//! receives, so tests can assert on the fallback context.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AIBackend;

/// A recorded `(system, user)` prompt pair
pub type RecordedPrompt = (String, String);

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    answer: String,
    /// When set, `complete` fails with this upstream error message
    failure: Option<String>,
    prompts: Arc<Mutex<Vec<RecordedPrompt>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a mock backend that answers "mock answer"
    pub fn new() -> Self {
        Self::with_answer("mock answer")
    }

    /// Create a mock backend with a custom answer
    pub fn with_answer(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            failure: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock backend whose calls always fail
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Prompts received so far (shared between clones)
    pub fn prompts(&self) -> Vec<RecordedPrompt> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((system.to_string(), user.to_string()));
        }
        match &self.failure {
            Some(message) => Err(Error::Upstream(message.clone())),
            None => Ok(self.answer.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_prompts_across_clones() {
        let mock = MockBackend::with_answer("7");
        let clone = mock.clone();
        assert_eq!(clone.complete("sys", "user").await.unwrap(), "7");
        assert_eq!(mock.prompts(), vec![("sys".to_string(), "user".to_string())]);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let err = MockBackend::failing("down").complete("s", "u").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }
}
