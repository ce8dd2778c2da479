//! Mock completion providers for testing.
//!
//! These implement [`CompletionProvider`] without any network access:
//!
//! - [`StaticProvider`] - always returns a fixed reply
//! - [`FailingProvider`] - always errors (simulates an unreachable backend)
//! - [`DelayedProvider`] - wraps another provider with artificial latency
//! - [`RecordingProvider`] - captures requests for assertions

use std::sync::Arc;
use std::time::Duration;

use provider_core::{
    async_trait, CompletionProvider, CompletionRequest, ProviderError,
};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// A provider that always returns the same reply.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    name: String,
    reply: String,
}

impl StaticProvider {
    /// Create a provider returning the given reply.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            name: "static".to_string(),
            reply: reply.into(),
        }
    }

    /// Create a provider with a custom name, for chains with several mocks.
    pub fn named(name: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for StaticProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ProviderError> {
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A provider that always fails, simulating an unreachable backend.
#[derive(Debug, Clone, Default)]
pub struct FailingProvider {
    message: Option<String>,
}

impl FailingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with a custom error message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

#[async_trait]
impl CompletionProvider for FailingProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, ProviderError> {
        Err(ProviderError::Network(
            self.message
                .clone()
                .unwrap_or_else(|| "connection refused".to_string()),
        ))
    }

    fn name(&self) -> &str {
        "failing"
    }

    async fn is_ready(&self) -> bool {
        false
    }
}

/// A provider that wraps another provider and adds artificial delay.
///
/// Useful for testing the generator's per-attempt timeout handling.
pub struct DelayedProvider<P: CompletionProvider> {
    inner: P,
    delay: Duration,
}

impl<P: CompletionProvider> DelayedProvider<P> {
    pub fn new(inner: P, delay: Duration) -> Self {
        Self { inner, delay }
    }

    pub fn with_millis(inner: P, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<P: CompletionProvider> CompletionProvider for DelayedProvider<P> {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        sleep(self.delay).await;
        self.inner.complete(request).await
    }

    fn name(&self) -> &str {
        "delayed"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }
}

/// A provider that records every request it receives.
#[derive(Clone)]
pub struct RecordingProvider {
    reply: String,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl RecordingProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// All requests received so far.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of completion calls made.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl CompletionProvider for RecordingProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.requests.lock().await.push(request);
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
