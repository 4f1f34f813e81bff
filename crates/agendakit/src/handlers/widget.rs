//! Endpoints describing the widget to embedders and to the demo page.

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Redirect},
    Json,
};
use serde::Serialize;

use agendakit_core::embed::{
    origin_str, DEFAULT_AUTO_RESIZE, DEFAULT_HEIGHT, DEFAULT_LAYOUT, DEFAULT_THEME, DEFAULT_TITLE,
    DEFAULT_WIDTH,
};
use agendakit_core::validation::{LAYOUTS, THEMES};

use crate::cache::CacheStats;
use crate::state::AppState;

/// URL parameters the widget page understands.
pub const SUPPORTED_PARAMS: [&str; 13] = [
    "eventId",
    "title",
    "theme",
    "layout",
    "width",
    "height",
    "autoResize",
    "disableHover",
    "showSpeakers",
    "showDate",
    "customBg",
    "customText",
    "customCard",
];

/// Placeholder written into the demo config when no default event is configured.
const NO_DEFAULT_EVENT: &str = "NO_EVENT_ID_FROM_ENV";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub domain: String,
    pub default_event_id: Option<String>,
    pub api_endpoint: String,
    pub available_themes: &'static [&'static str],
    pub available_layouts: &'static [&'static str],
    pub supported_params: &'static [&'static str],
    pub cache_info: CacheStats,
}

/// GET /api/widget-config
#[axum::debug_handler]
pub async fn widget_config(State(state): State<AppState>) -> Json<WidgetConfig> {
    let domain = origin_str(&state.config.widget_domain).to_string();

    Json(WidgetConfig {
        api_endpoint: format!("{domain}/api"),
        domain,
        default_event_id: state.config.default_event_id.clone(),
        available_themes: &THEMES,
        available_layouts: &LAYOUTS,
        supported_params: &SUPPORTED_PARAMS,
        cache_info: state.upstream.cache_stats().await,
    })
}

/// GET / - sends visitors to the demo page.
pub async fn root() -> Redirect {
    Redirect::to("/demo/")
}

/// GET /demo/config.js - defaults for the embed generator demo page.
#[axum::debug_handler]
pub async fn demo_config(State(state): State<AppState>) -> impl IntoResponse {
    let server_base = origin_str(&state.config.widget_domain);
    let default_event_id = state
        .config
        .default_event_id
        .as_deref()
        .unwrap_or(NO_DEFAULT_EVENT);

    let defaults = serde_json::json!({
        "title": DEFAULT_TITLE,
        "theme": DEFAULT_THEME,
        "layout": DEFAULT_LAYOUT,
        "width": DEFAULT_WIDTH,
        "height": DEFAULT_HEIGHT,
        "autoResize": DEFAULT_AUTO_RESIZE == "true",
    });
    let server_base_js = serde_json::Value::from(server_base);
    let event_js = serde_json::Value::from(default_event_id);

    let body = format!(
        "window.EMBED_CONFIG = {{\n    serverBase: window.location.origin || {server_base_js},\n    apiServerBase: {server_base_js},\n    defaultEventId: {event_js},\n    defaults: {defaults},\n    debugMode: false,\n    _timestamp: Date.now()\n}};\n"
    );

    ([(CONTENT_TYPE, "application/javascript")], body)
}
