//! LocalProvider implementation.

use provider_core::{async_trait, CompletionProvider, CompletionRequest, ProviderError};
use reqwest::Client;
use tracing::{debug, warn};

use crate::api_types::{GenerateRequest, GenerateResponse, HealthResponse, HistoryEntry};
use crate::config::LocalProviderConfig;

/// A provider that calls the self-hosted model server.
///
/// The server exposes `POST /generate` taking the current prompt plus recent
/// history and applies its own system prompt and sampling settings, so the
/// request's `system_prompt`/`temperature` are not forwarded.
pub struct LocalProvider {
    client: Client,
    config: LocalProviderConfig,
}

impl LocalProvider {
    /// Create a new LocalProvider with the given configuration.
    pub fn new(config: LocalProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Create a LocalProvider from environment variables.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(LocalProviderConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &LocalProviderConfig {
        &self.config
    }

    fn build_request(&self, request: &CompletionRequest) -> Result<GenerateRequest, ProviderError> {
        let prompt = request
            .prompt()
            .ok_or_else(|| ProviderError::Configuration("request has no user turn".to_string()))?
            .to_string();

        let history = request.history();
        let start = history.len().saturating_sub(self.config.max_history_turns);
        let history = history[start..]
            .iter()
            .map(|turn| HistoryEntry {
                role: turn.role.as_str().to_string(),
                content: turn.text.clone(),
            })
            .collect();

        Ok(GenerateRequest {
            prompt,
            history,
            peer_id: None,
        })
    }
}

#[async_trait]
impl CompletionProvider for LocalProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let body = self.build_request(&request)?;

        debug!(
            "Calling local model server ({} history turns)",
            body.history.len()
        );

        let response = self
            .client
            .post(self.config.generate_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("local server unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if let Some(error) = generated.error {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error,
            });
        }

        match generated.response {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ProviderError::EmptyCompletion),
        }
    }

    fn name(&self) -> &str {
        "local"
    }

    async fn is_ready(&self) -> bool {
        match self.client.get(self.config.health_url()).send().await {
            Ok(resp) if resp.status().is_success() => resp
                .json::<HealthResponse>()
                .await
                .map(|h| h.ready)
                .unwrap_or(false),
            Ok(resp) => {
                warn!("Local model health check returned {}", resp.status());
                false
            }
            Err(e) => {
                debug!("Local model health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provider_core::ChatTurn;

    fn provider() -> LocalProvider {
        LocalProvider::new(LocalProviderConfig::default()).unwrap()
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(provider().name(), "local");
    }

    #[test]
    fn test_build_request_splits_prompt_and_history() {
        let request = CompletionRequest {
            turns: vec![
                ChatTurn::user("first"),
                ChatTurn::assistant("reply"),
                ChatTurn::user("second"),
            ],
            ..Default::default()
        };

        let body = provider().build_request(&request).unwrap();
        assert_eq!(body.prompt, "second");
        assert_eq!(body.history.len(), 2);
        assert_eq!(body.history[0].role, "user");
        assert_eq!(body.history[1].role, "assistant");
    }

    #[test]
    fn test_build_request_caps_history() {
        let config = LocalProviderConfig {
            max_history_turns: 2,
            ..Default::default()
        };
        let provider = LocalProvider::new(config).unwrap();

        let mut turns = Vec::new();
        for i in 0..6 {
            turns.push(ChatTurn::user(format!("m{}", i)));
        }
        let request = CompletionRequest {
            turns,
            ..Default::default()
        };

        let body = provider.build_request(&request).unwrap();
        assert_eq!(body.prompt, "m5");
        assert_eq!(body.history.len(), 2);
        assert_eq!(body.history[0].content, "m3");
    }

    #[test]
    fn test_build_request_requires_user_turn() {
        let request = CompletionRequest::default();
        assert!(provider().build_request(&request).is_err());
    }
}
