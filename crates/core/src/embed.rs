//! Embed snippet generation for the agenda widget.
//!
//! Pure functions: given validated parameters and the public widget origin,
//! build the widget URL and the iframe markup a customer pastes into a page.

use serde::Serialize;
use url::Url;

use crate::validation::escape_html;

pub const DEFAULT_TITLE: &str = "Event Agenda";
pub const DEFAULT_THEME: &str = "light";
pub const DEFAULT_LAYOUT: &str = "list";
pub const DEFAULT_WIDTH: &str = "100%";
pub const DEFAULT_HEIGHT: &str = "600";
pub const DEFAULT_AUTO_RESIZE: &str = "true";
pub const DEFAULT_SHOW_DATE: &str = "false";

/// Resolved widget configuration, echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedConfiguration {
    pub event_id: String,
    pub title: String,
    pub theme: String,
    pub layout: String,
    pub width: String,
    pub height: String,
    pub auto_resize: String,
    pub show_date: String,
}

/// Optional overrides taken from the request.
#[derive(Debug, Clone, Default)]
pub struct EmbedOverrides {
    pub event_id: Option<String>,
    pub title: Option<String>,
    pub theme: Option<String>,
    pub layout: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub auto_resize: Option<String>,
    pub show_date: Option<String>,
}

impl EmbedConfiguration {
    /// Applies defaults to `overrides`. The title is HTML-escaped.
    ///
    /// Returns `None` when neither the request nor `default_event_id` names an event.
    pub fn resolve(overrides: EmbedOverrides, default_event_id: Option<&str>) -> Option<Self> {
        let event_id = overrides
            .event_id
            .or_else(|| default_event_id.map(str::to_string))?;

        Some(Self {
            event_id,
            title: overrides
                .title
                .map(|t| escape_html(&t))
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            theme: overrides.theme.unwrap_or_else(|| DEFAULT_THEME.to_string()),
            layout: overrides
                .layout
                .unwrap_or_else(|| DEFAULT_LAYOUT.to_string()),
            width: overrides.width.unwrap_or_else(|| DEFAULT_WIDTH.to_string()),
            height: overrides
                .height
                .unwrap_or_else(|| DEFAULT_HEIGHT.to_string()),
            auto_resize: overrides
                .auto_resize
                .unwrap_or_else(|| DEFAULT_AUTO_RESIZE.to_string()),
            show_date: overrides
                .show_date
                .unwrap_or_else(|| DEFAULT_SHOW_DATE.to_string()),
        })
    }
}

/// Generated embed snippets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedCode {
    pub widget_url: String,
    pub embed_code: String,
    pub responsive_embed_code: String,
    pub configuration: EmbedConfiguration,
}

/// Returns `origin` as a string without a trailing slash.
pub fn origin_str(origin: &Url) -> &str {
    origin.as_str().trim_end_matches('/')
}

/// Builds the widget URL served under `/agenda/` on `origin`.
pub fn widget_url(origin: &Url, config: &EmbedConfiguration) -> Result<Url, url::ParseError> {
    let mut url = origin.join("/agenda/")?;
    let api_base = format!("{}/api", origin_str(origin));

    url.query_pairs_mut()
        .append_pair("eventId", &config.event_id)
        .append_pair("apiBaseUrl", &api_base)
        .append_pair("title", &config.title)
        .append_pair("theme", &config.theme)
        .append_pair("layout", &config.layout)
        .append_pair("autoResize", &config.auto_resize)
        .append_pair("showDate", &config.show_date);

    Ok(url)
}

/// Generates the fixed-size and responsive iframe snippets.
pub fn generate(origin: &Url, configuration: EmbedConfiguration) -> Result<EmbedCode, url::ParseError> {
    let url = widget_url(origin, &configuration)?;
    let src = url.as_str();
    let title = &configuration.title;

    let embed_code = format!(
        "<iframe\n  src=\"{src}\"\n  width=\"{width}\"\n  height=\"{height}\"\n  frameborder=\"0\"\n  style=\"border: none; overflow: hidden;\"\n  title=\"{title}\">\n</iframe>",
        width = configuration.width,
        height = configuration.height,
    );

    let responsive_embed_code = format!(
        "<div style=\"position: relative; width: 100%; height: 0; padding-bottom: 56.25%;\">\n  <iframe\n    src=\"{src}\"\n    style=\"position: absolute; top: 0; left: 0; width: 100%; height: 100%; border: none;\"\n    frameborder=\"0\"\n    title=\"{title}\">\n  </iframe>\n</div>"
    );

    Ok(EmbedCode {
        widget_url: src.to_string(),
        embed_code,
        responsive_embed_code,
        configuration,
    })
}
