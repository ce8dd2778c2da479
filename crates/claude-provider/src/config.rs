//! Configuration for the Claude provider.

use std::env;
use std::time::Duration;

use provider_core::ProviderError;

/// API version header value required by the Messages API.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for [`ClaudeProvider`](crate::ClaudeProvider).
#[derive(Debug, Clone)]
pub struct ClaudeProviderConfig {
    /// API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Maximum tokens for the response.
    pub max_tokens: u32,

    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for ClaudeProviderConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com".to_string(),
            api_key: String::new(),
            model: "claude-3-5-haiku-latest".to_string(),
            max_tokens: 1024,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClaudeProviderConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ANTHROPIC_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `ANTHROPIC_API_URL` - API URL (default: https://api.anthropic.com)
    /// - `ANTHROPIC_MODEL` - Model name (default: claude-3-5-haiku-latest)
    /// - `ANTHROPIC_MAX_TOKENS` - Max tokens (default: 1024)
    /// - `ANTHROPIC_TIMEOUT_SECS` - Request timeout (default: 30)
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ProviderError::Configuration("ANTHROPIC_API_KEY not set".to_string()))?;

        let api_url = env::var("ANTHROPIC_API_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com".to_string());

        let model = env::var("ANTHROPIC_MODEL")
            .unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string());

        let max_tokens = env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1024);

        let timeout = env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        Ok(Self {
            api_url,
            api_key,
            model,
            max_tokens,
            timeout,
        })
    }

    /// URL of the messages endpoint.
    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.api_url.trim_end_matches('/'))
    }
}
