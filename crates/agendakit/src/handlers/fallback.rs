use axum::{
    extract::OriginalUri,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

/// Routes advertised to clients that hit an unknown path.
pub const AVAILABLE_ENDPOINTS: [&str; 8] = [
    "GET /",
    "GET /health",
    "GET /demo/config.js",
    "GET /api/sessions/:eventId",
    "GET /api/events/:eventId",
    "GET /api/speakers/:eventId",
    "GET /api/embed-code",
    "GET /api/widget-config",
];

/// Fallback for any unmatched route.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "message": format!("Path {path} does not exist"),
            "availableEndpoints": AVAILABLE_ENDPOINTS,
        })),
    )
}
