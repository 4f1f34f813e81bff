//! GET /health - service status with a live cache health check.

use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use agendakit_core::embed::origin_str;

use crate::cache::CacheStats;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
    pub widget_url: String,
    pub demo_url: String,
    pub environment: &'static str,
    pub cache_health: CacheStats,
}

/// GET /health
///
/// Always answers 200; an unreachable Redis shows up in `cache_health`.
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let origin = origin_str(&state.config.widget_domain);

    Json(HealthResponse {
        status: "ok",
        message: "Agenda Widget Service",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        widget_url: format!("{origin}/agenda/"),
        demo_url: format!("{origin}/demo/"),
        environment: state.config.environment.as_str(),
        cache_health: state.cache.health_check().await,
    })
}
