//! Completion provider backed by the Anthropic Messages API.
//!
//! This is the cloud fallback for when the tunneled local model is down,
//! and the primary backend when `ai_engine` is set to `claude`.

mod api_types;
mod config;
mod provider;

pub use config::ClaudeProviderConfig;
pub use provider::ClaudeProvider;
