//! Completion provider backed by the self-hosted model server.
//!
//! The server runs on a GPU box and is reached through a reverse SSH tunnel,
//! so it may be intermittently unreachable; callers fall back to the remote
//! provider when that happens.

mod api_types;
mod config;
mod provider;

pub use config::LocalProviderConfig;
pub use provider::LocalProvider;
