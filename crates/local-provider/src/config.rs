//! Configuration for the local provider.

use std::env;
use std::time::Duration;

use provider_core::ProviderError;

/// Configuration for [`LocalProvider`](crate::LocalProvider).
#[derive(Debug, Clone)]
pub struct LocalProviderConfig {
    /// Base URL of the model server (the local end of the tunnel).
    pub base_url: String,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// Maximum number of history turns to forward.
    pub max_history_turns: usize,
}

impl Default for LocalProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout: Duration::from_secs(10),
            max_history_turns: 10,
        }
    }
}

impl LocalProviderConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `LOCAL_AI_URL` - Base URL (default: http://127.0.0.1:8080)
    /// - `LOCAL_AI_TIMEOUT_SECS` - Request timeout (default: 10)
    /// - `LOCAL_AI_MAX_HISTORY_TURNS` - History turns to forward (default: 10)
    pub fn from_env() -> Result<Self, ProviderError> {
        let base_url =
            env::var("LOCAL_AI_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

        let timeout = env::var("LOCAL_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        let max_history_turns = env::var("LOCAL_AI_MAX_HISTORY_TURNS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            base_url,
            timeout,
            max_history_turns,
        })
    }

    /// URL of the generate endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/generate", self.base_url.trim_end_matches('/'))
    }

    /// URL of the health endpoint.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LocalProviderConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_history_turns, 10);
    }

    #[test]
    fn test_endpoint_urls_strip_trailing_slash() {
        let config = LocalProviderConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.generate_url(), "http://localhost:8080/generate");
        assert_eq!(config.health_url(), "http://localhost:8080/health");
    }
}
