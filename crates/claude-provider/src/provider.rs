//! ClaudeProvider implementation.

use provider_core::{async_trait, CompletionProvider, CompletionRequest, ProviderError};
use reqwest::Client;
use tracing::debug;

use crate::api_types::{ApiError, ApiMessage, MessagesRequest, MessagesResponse};
use crate::config::{ClaudeProviderConfig, ANTHROPIC_VERSION};

/// A provider that calls the Anthropic Messages API.
pub struct ClaudeProvider {
    client: Client,
    config: ClaudeProviderConfig,
}

impl ClaudeProvider {
    /// Create a new ClaudeProvider with the given configuration.
    pub fn new(config: ClaudeProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::Configuration(
                "anthropic api key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Create a ClaudeProvider from environment variables.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(ClaudeProviderConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClaudeProviderConfig {
        &self.config
    }

    fn build_request(&self, request: &CompletionRequest) -> MessagesRequest {
        // The Messages API requires alternating roles starting with "user";
        // collapse any leading assistant turns into the history tail.
        let messages = request
            .turns
            .iter()
            .skip_while(|t| t.role == provider_core::Role::Assistant)
            .map(|turn| ApiMessage {
                role: turn.role.as_str().to_string(),
                content: turn.text.clone(),
            })
            .collect();

        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            system: request.system_prompt.clone(),
            temperature: request.temperature,
            messages,
        }
    }
}

#[async_trait]
impl CompletionProvider for ClaudeProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let body = self.build_request(&request);

        if body.messages.is_empty() {
            return Err(ProviderError::Configuration(
                "request has no user turn".to_string(),
            ));
        }

        debug!(
            "Calling Anthropic API (model: {}, {} messages)",
            body.model,
            body.messages.len()
        );

        let response = self
            .client
            .post(self.config.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let text: String = completion
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text.as_str())
            .collect();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }

        Ok(text)
    }

    fn name(&self) -> &str {
        "claude"
    }
}
