//! Response generation: template text or an AI completion with fallback.

use std::sync::Arc;
use std::time::Duration;

use provider_core::{ChatTurn, CompletionProvider, CompletionRequest};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::resolver::ReplyMode;
use crate::settings::{Engine, GlobalSettings};

/// Used when template mode has neither a rule template nor a global default.
const FALLBACK_TEMPLATE: &str = "Thanks for your message! I'll get back to you soon.";

/// Default bound on a single provider attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(8);

/// Both providers failed, or the mode cannot produce text.
#[derive(Debug, thiserror::Error)]
#[error("generation failed: {0}")]
pub struct GenerationFailure(pub String);

/// Produces reply text for a resolved policy.
///
/// Holds one provider per engine; `ai` mode tries the preferred engine
/// first and the other as fallback, each attempt bounded by a timeout.
/// Failures are never retried within the same message cycle.
pub struct ResponseGenerator {
    local: Arc<dyn CompletionProvider>,
    claude: Arc<dyn CompletionProvider>,
    attempt_timeout: Duration,
}

impl ResponseGenerator {
    pub fn new(local: Arc<dyn CompletionProvider>, claude: Arc<dyn CompletionProvider>) -> Self {
        Self {
            local,
            claude,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    fn chain(&self, preferred: Engine) -> [&dyn CompletionProvider; 2] {
        match preferred {
            Engine::Local => [self.local.as_ref(), self.claude.as_ref()],
            Engine::Claude => [self.claude.as_ref(), self.local.as_ref()],
        }
    }

    /// Generate reply text for the resolved mode.
    ///
    /// `context` is the bounded conversation window, oldest first, ending
    /// with the message being replied to.
    pub async fn generate(
        &self,
        mode: &ReplyMode,
        settings: &GlobalSettings,
        context: Vec<ChatTurn>,
    ) -> Result<String, GenerationFailure> {
        match mode {
            ReplyMode::Template { text } => Ok(text
                .clone()
                .or_else(|| settings.default_template.clone())
                .unwrap_or_else(|| FALLBACK_TEMPLATE.to_string())),
            ReplyMode::Ai { prompt } => {
                let request = CompletionRequest {
                    system_prompt: prompt.clone().or_else(|| settings.system_prompt.clone()),
                    temperature: Some(settings.temperature),
                    max_tokens: settings.max_tokens,
                    turns: context,
                };
                self.complete_with_fallback(settings.ai_engine, request).await
            }
            ReplyMode::Off => Err(GenerationFailure("off mode generates nothing".to_string())),
        }
    }

    async fn complete_with_fallback(
        &self,
        preferred: Engine,
        request: CompletionRequest,
    ) -> Result<String, GenerationFailure> {
        let mut last_error = String::new();

        for provider in self.chain(preferred) {
            debug!("Trying provider {}", provider.name());

            match timeout(self.attempt_timeout, provider.complete(request.clone())).await {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    debug!("Provider {} produced {} chars", provider.name(), text.len());
                    return Ok(text);
                }
                Ok(Ok(_)) => {
                    warn!("Provider {} returned empty text", provider.name());
                    last_error = format!("{}: empty completion", provider.name());
                }
                Ok(Err(e)) => {
                    warn!("Provider {} failed: {}", provider.name(), e);
                    last_error = format!("{}: {}", provider.name(), e);
                }
                Err(_) => {
                    warn!(
                        "Provider {} timed out after {:?}",
                        provider.name(),
                        self.attempt_timeout
                    );
                    last_error = format!("{}: timed out", provider.name());
                }
            }
        }

        Err(GenerationFailure(last_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_provider::{DelayedProvider, FailingProvider, RecordingProvider, StaticProvider};

    fn settings() -> GlobalSettings {
        GlobalSettings {
            auto_reply_enabled: true,
            system_prompt: Some("be helpful".to_string()),
            ..GlobalSettings::default()
        }
    }

    fn context() -> Vec<ChatTurn> {
        vec![ChatTurn::user("hello")]
    }

    #[tokio::test]
    async fn test_template_fallback_chain() {
        let generator = ResponseGenerator::new(
            Arc::new(FailingProvider::new()),
            Arc::new(FailingProvider::new()),
        );

        let with_rule_text = ReplyMode::Template {
            text: Some("on vacation".to_string()),
        };
        assert_eq!(
            generator.generate(&with_rule_text, &settings(), context()).await.unwrap(),
            "on vacation"
        );

        let without_rule_text = ReplyMode::Template { text: None };
        let mut settings_with_default = settings();
        settings_with_default.default_template = Some("back later".to_string());
        assert_eq!(
            generator
                .generate(&without_rule_text, &settings_with_default, context())
                .await
                .unwrap(),
            "back later"
        );

        assert_eq!(
            generator
                .generate(&without_rule_text, &settings(), context())
                .await
                .unwrap(),
            FALLBACK_TEMPLATE
        );
    }

    #[tokio::test]
    async fn test_preferred_provider_wins_when_healthy() {
        let local = Arc::new(RecordingProvider::new("from-local"));
        let claude = Arc::new(RecordingProvider::new("from-claude"));
        let generator = ResponseGenerator::new(local.clone(), claude.clone());

        let text = generator
            .generate(&ReplyMode::Ai { prompt: None }, &settings(), context())
            .await
            .unwrap();

        assert_eq!(text, "from-local");
        assert_eq!(local.call_count().await, 1);
        assert_eq!(claude.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_fallback_on_provider_error() {
        let generator = ResponseGenerator::new(
            Arc::new(FailingProvider::with_message("tunnel down")),
            Arc::new(StaticProvider::named("claude", "from-claude")),
        );

        let text = generator
            .generate(&ReplyMode::Ai { prompt: None }, &settings(), context())
            .await
            .unwrap();
        assert_eq!(text, "from-claude");
    }

    #[tokio::test]
    async fn test_fallback_on_timeout() {
        let slow = DelayedProvider::with_millis(StaticProvider::new("too late"), 200);
        let generator = ResponseGenerator::new(
            Arc::new(slow),
            Arc::new(StaticProvider::named("claude", "in time")),
        )
        .with_attempt_timeout(Duration::from_millis(50));

        let text = generator
            .generate(&ReplyMode::Ai { prompt: None }, &settings(), context())
            .await
            .unwrap();
        assert_eq!(text, "in time");
    }

    #[tokio::test]
    async fn test_both_providers_failing_is_a_hard_failure() {
        let generator = ResponseGenerator::new(
            Arc::new(FailingProvider::new()),
            Arc::new(FailingProvider::new()),
        );

        let result = generator
            .generate(&ReplyMode::Ai { prompt: None }, &settings(), context())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_completion_triggers_fallback() {
        let generator = ResponseGenerator::new(
            Arc::new(StaticProvider::named("local", "   ")),
            Arc::new(StaticProvider::named("claude", "real text")),
        );

        let text = generator
            .generate(&ReplyMode::Ai { prompt: None }, &settings(), context())
            .await
            .unwrap();
        assert_eq!(text, "real text");
    }

    #[tokio::test]
    async fn test_rule_prompt_overrides_system_prompt() {
        let recorder = Arc::new(RecordingProvider::new("ok"));
        let generator = ResponseGenerator::new(recorder.clone(), Arc::new(FailingProvider::new()));

        generator
            .generate(
                &ReplyMode::Ai {
                    prompt: Some("answer in one word".to_string()),
                },
                &settings(),
                context(),
            )
            .await
            .unwrap();

        let requests = recorder.requests().await;
        assert_eq!(requests[0].system_prompt.as_deref(), Some("answer in one word"));
    }

    #[tokio::test]
    async fn test_claude_preference_reorders_chain() {
        let local = Arc::new(RecordingProvider::new("from-local"));
        let claude = Arc::new(RecordingProvider::new("from-claude"));
        let generator = ResponseGenerator::new(local.clone(), claude.clone());

        let mut prefer_claude = settings();
        prefer_claude.ai_engine = Engine::Claude;

        let text = generator
            .generate(&ReplyMode::Ai { prompt: None }, &prefer_claude, context())
            .await
            .unwrap();

        assert_eq!(text, "from-claude");
        assert_eq!(local.call_count().await, 0);
    }
}
