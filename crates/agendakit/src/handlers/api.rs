//! Proxy endpoints for upstream event data.
//!
//! - `GET /api/sessions/{event_id}` - session list
//! - `GET /api/events/{event_id}` - event details
//! - `GET /api/speakers/{event_id}` - speaker list
//!
//! The event id is validated before the upstream client is touched.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use agendakit_core::validation::validate_path_event_id;

use super::error::ApiError;
use crate::state::AppState;

/// GET /api/sessions/{event_id}
#[axum::debug_handler]
pub async fn sessions(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    validate_path_event_id(&event_id)?;

    match state.upstream.get_event_sessions(&event_id).await {
        Ok(sessions) => Ok(Json(sessions)),
        Err(err) => Err(ApiError::upstream("Failed to fetch sessions", event_id, err)),
    }
}

/// GET /api/events/{event_id}
#[axum::debug_handler]
pub async fn event_details(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    validate_path_event_id(&event_id)?;

    match state.upstream.get_event_details(&event_id).await {
        Ok(event) => Ok(Json(event)),
        Err(err) => Err(ApiError::upstream(
            "Failed to fetch event details",
            event_id,
            err,
        )),
    }
}

/// GET /api/speakers/{event_id}
#[axum::debug_handler]
pub async fn speakers(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    validate_path_event_id(&event_id)?;

    match state.upstream.get_event_speakers(&event_id).await {
        Ok(speakers) => Ok(Json(speakers)),
        Err(err) => Err(ApiError::upstream("Failed to fetch speakers", event_id, err)),
    }
}
