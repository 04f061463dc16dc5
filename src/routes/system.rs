use rocket::{get, serde::json::Json, State};
use chrono::{SecondsFormat, Utc};
use crate::models::HealthResponse;
use crate::registry::ConnectionRegistry;
use std::sync::Arc;

// ── Health ──

#[get("/health")]
pub fn health(registry: &State<Arc<ConnectionRegistry>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        active_connections: registry.size(),
    })
}
