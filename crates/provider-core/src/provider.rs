//! The CompletionProvider trait.

use async_trait::async_trait;

use crate::chat::CompletionRequest;
use crate::error::ProviderError;

/// A completion backend the response generator can call.
///
/// Implementations are tried in a configured order by the generator; every
/// backend shares this one contract so fallback needs no backend-specific
/// handling.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a reply for the given context.
    ///
    /// Returns the reply text, or an error if the backend is unreachable,
    /// rejected the request, or produced nothing usable. Callers bound this
    /// with their own timeout.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    /// Short name for logging (e.g. "local", "claude").
    fn name(&self) -> &str;

    /// Whether the backend is currently reachable.
    ///
    /// Default implementation assumes it is; HTTP providers override this
    /// with a real health check.
    async fn is_ready(&self) -> bool {
        true
    }
}
