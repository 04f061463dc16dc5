use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    /// Forwarded verbatim; `null` and a missing field both land as `None`.
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
    pub success: bool,
    pub clients_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub active_connections: usize,
}
