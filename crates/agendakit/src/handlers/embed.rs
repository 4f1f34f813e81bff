//! GET /api/embed-code - iframe snippets for embedding the agenda widget.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use agendakit_core::embed::{self, EmbedCode, EmbedConfiguration, EmbedOverrides};
use agendakit_core::validation::{validate_embed_params, EmbedParams};

use super::error::ApiError;
use crate::state::AppState;

/// Raw query string parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedQuery {
    pub event_id: Option<String>,
    pub title: Option<String>,
    pub theme: Option<String>,
    pub layout: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub auto_resize: Option<String>,
    pub show_date: Option<String>,
}

impl EmbedQuery {
    fn params(&self) -> EmbedParams<'_> {
        EmbedParams {
            event_id: self.event_id.as_deref(),
            title: self.title.as_deref(),
            theme: self.theme.as_deref(),
            layout: self.layout.as_deref(),
            width: self.width.as_deref(),
            height: self.height.as_deref(),
            auto_resize: self.auto_resize.as_deref(),
        }
    }
}

impl From<EmbedQuery> for EmbedOverrides {
    fn from(query: EmbedQuery) -> Self {
        Self {
            event_id: query.event_id,
            title: query.title,
            theme: query.theme,
            layout: query.layout,
            width: query.width,
            height: query.height,
            auto_resize: query.auto_resize,
            show_date: query.show_date,
        }
    }
}

/// GET /api/embed-code
#[axum::debug_handler]
pub async fn embed_code(
    State(state): State<AppState>,
    Query(query): Query<EmbedQuery>,
) -> Result<Json<EmbedCode>, ApiError> {
    validate_embed_params(&query.params())?;

    let configuration =
        EmbedConfiguration::resolve(query.into(), state.config.default_event_id.as_deref())
            .ok_or(ApiError::MissingEventId)?;

    let code = embed::generate(&state.config.widget_domain, configuration)
        .map_err(|err| ApiError::internal(err, state.config.environment))?;

    tracing::debug!(event_id = %code.configuration.event_id, "Generated embed code");
    Ok(Json(code))
}
