//! Process-wide configuration
//!
//! Built once at startup and shared read-only with the solver, the LLM
//! backend, and the command/API invoker.
//!
//! # Configuration
//!
//! Environment variables:
//! - `ASSAY_LLM_URL`: Chat completions endpoint (default: the AI proxy)
//! - `AIPROXY_TOKEN`: Bearer token for the endpoint (optional)
//! - `ASSAY_LLM_MODEL`: Model name (default: gpt-4o-mini)
//! - `ASSAY_LLM_TIMEOUT_SECS`: LLM request timeout (default: 60)
//! - `ASSAY_HTTP_TIMEOUT_SECS`: API request engine timeout (default: 30)
//! - `ASSAY_SHELL_TIMEOUT_SECS`: Shell command timeout (default: 30)
//! - `ASSAY_ALLOW_SHELL`: Enable shell command execution (default: false)

use std::time::Duration;

use tracing::warn;

/// Default chat completions endpoint
pub const DEFAULT_LLM_URL: &str = "http://aiproxy.sanand.workers.dev/openai/v1/chat/completions";

/// Default model for the fallback path
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// LLM fallback settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Full chat completions URL
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LLM_URL.to_string(),
            api_key: None,
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 150,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Command/API invoker settings
#[derive(Debug, Clone)]
pub struct InvokerConfig {
    /// Shell commands are refused unless this is set
    pub allow_shell: bool,
    pub shell_timeout: Duration,
    pub http_timeout: Duration,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            allow_shell: false,
            shell_timeout: Duration::from_secs(30),
            http_timeout: Duration::from_secs(30),
        }
    }
}

/// Immutable application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub llm: LlmConfig,
    pub invoker: InvokerConfig,
}

impl Config {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary key lookup (environment, test map, ...)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let llm = LlmConfig {
            endpoint: get("ASSAY_LLM_URL").unwrap_or(defaults.llm.endpoint),
            api_key: get("AIPROXY_TOKEN"),
            model: get("ASSAY_LLM_MODEL").unwrap_or(defaults.llm.model),
            temperature: defaults.llm.temperature,
            max_tokens: defaults.llm.max_tokens,
            timeout: parse_secs(get("ASSAY_LLM_TIMEOUT_SECS"), defaults.llm.timeout),
        };

        let invoker = InvokerConfig {
            allow_shell: get("ASSAY_ALLOW_SHELL")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false),
            shell_timeout: parse_secs(
                get("ASSAY_SHELL_TIMEOUT_SECS"),
                defaults.invoker.shell_timeout,
            ),
            http_timeout: parse_secs(
                get("ASSAY_HTTP_TIMEOUT_SECS"),
                defaults.invoker.http_timeout,
            ),
        };

        Self { llm, invoker }
    }
}

fn parse_secs(value: Option<String>, default: Duration) -> Duration {
    match value {
        Some(v) => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(value = %v, "Invalid timeout, using default");
                default
            }
        },
        None => default,
    }
}
