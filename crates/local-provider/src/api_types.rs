//! Wire types for the local model server.

use serde::{Deserialize, Serialize};

/// A history entry in the server's `{role, content}` shape.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

/// Request body for `POST /generate`.
///
/// The server keeps its own system prompt and sampling settings; only the
/// prompt and recent history travel over the wire.
#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<i64>,
}

/// Response body from `POST /generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: Option<String>,
    pub error: Option<String>,
}

/// Response body from `GET /health`.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub ready: bool,
}
