//! Core trait and types for AI completion providers.
//!
//! This crate provides the shared interface for every completion backend
//! the auto-reply engine can talk to. It defines:
//!
//! - [`CompletionProvider`] - The trait all provider implementations implement
//! - [`CompletionRequest`] / [`ChatTurn`] - Request types for a completion call
//! - [`ProviderError`] - Error types for provider operations
//!
//! # Example
//!
//! ```rust
//! use provider_core::{CompletionProvider, CompletionRequest, ProviderError};
//! use async_trait::async_trait;
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl CompletionProvider for MyProvider {
//!     async fn complete(&self, _request: CompletionRequest) -> Result<String, ProviderError> {
//!         Ok("hello".to_string())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "MyProvider"
//!     }
//! }
//! ```

mod chat;
mod error;
mod provider;

pub use chat::{ChatTurn, CompletionRequest, Role};
pub use error::ProviderError;
pub use provider::CompletionProvider;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
