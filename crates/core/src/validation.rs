//! Pure validation of inbound request parameters.
//!
//! Failures are collected into [`ValidationErrors`] so the HTTP layer can
//! report every offending field at once, before any upstream call is made.

use serde::Serialize;
use thiserror::Error;

/// Maximum length of an event identifier.
pub const EVENT_ID_MAX_LEN: usize = 50;

/// Maximum length of an embed title (before escaping).
pub const TITLE_MAX_LEN: usize = 100;

/// Accepted iframe height range in pixels.
pub const HEIGHT_RANGE: std::ops::RangeInclusive<i64> = 100..=2000;

/// Themes understood by the widget.
pub const THEMES: [&str; 3] = ["light", "dark", "minimal"];

/// Layouts understood by the widget.
pub const LAYOUTS: [&str; 4] = ["list", "grid", "compact", "timeline"];

const EVENT_ID_MESSAGE: &str = "EventId must be alphanumeric with underscores/hyphens only";

/// Where a rejected value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Params,
    Query,
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDetail {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    pub msg: String,
    pub path: String,
    pub location: Location,
}

impl ValidationDetail {
    fn field(path: &str, value: &str, msg: &str, location: Location) -> Self {
        Self {
            kind: "field",
            value: value.to_string(),
            msg: msg.to_string(),
            path: path.to_string(),
            location,
        }
    }
}

/// Every rejected field of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("Invalid input parameters")]
pub struct ValidationErrors {
    pub details: Vec<ValidationDetail>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    pub fn push(&mut self, detail: ValidationDetail) {
        self.details.push(detail);
    }

    /// Converts the collected errors into a `Result`, `Ok(value)` when empty.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Returns true when `id` matches `^[a-zA-Z0-9_-]+$` and is at most 50 characters.
///
/// ```
/// use agendakit_core::validation::is_valid_event_id;
///
/// assert!(is_valid_event_id("evt_123-abc"));
/// assert!(!is_valid_event_id("bad@id"));
/// assert!(!is_valid_event_id(""));
/// ```
pub fn is_valid_event_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= EVENT_ID_MAX_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Validates an event identifier taken from a path segment.
pub fn validate_path_event_id(id: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if !is_valid_event_id(id) {
        errors.push(ValidationDetail::field(
            "eventId",
            id,
            EVENT_ID_MESSAGE,
            Location::Params,
        ));
    }
    errors.into_result(())
}

/// Checks an optional query value, recording a detail when `valid` rejects it.
fn check_query(
    errors: &mut ValidationErrors,
    path: &str,
    value: Option<&str>,
    msg: &str,
    valid: impl Fn(&str) -> bool,
) {
    if let Some(value) = value {
        if !valid(value) {
            errors.push(ValidationDetail::field(path, value, msg, Location::Query));
        }
    }
}

/// Raw embed-code query values, as they arrive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedParams<'a> {
    pub event_id: Option<&'a str>,
    pub title: Option<&'a str>,
    pub theme: Option<&'a str>,
    pub layout: Option<&'a str>,
    pub width: Option<&'a str>,
    pub height: Option<&'a str>,
    pub auto_resize: Option<&'a str>,
}

/// Validates embed-code query parameters. Absent parameters are always valid.
pub fn validate_embed_params(params: &EmbedParams<'_>) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    check_query(
        &mut errors,
        "eventId",
        params.event_id,
        EVENT_ID_MESSAGE,
        is_valid_event_id,
    );
    check_query(
        &mut errors,
        "title",
        params.title,
        "Title must be 1-100 characters",
        |t| (1..=TITLE_MAX_LEN).contains(&t.chars().count()),
    );
    check_query(
        &mut errors,
        "theme",
        params.theme,
        "Theme must be light, dark, or minimal",
        |t| THEMES.contains(&t),
    );
    check_query(
        &mut errors,
        "layout",
        params.layout,
        "Layout must be list, grid, compact, or timeline",
        |l| LAYOUTS.contains(&l),
    );
    check_query(
        &mut errors,
        "width",
        params.width,
        "Width must be a number with optional % or px suffix",
        is_valid_width,
    );
    check_query(
        &mut errors,
        "height",
        params.height,
        "Height must be between 100 and 2000 pixels",
        |h| h.parse::<i64>().is_ok_and(|h| HEIGHT_RANGE.contains(&h)),
    );
    check_query(
        &mut errors,
        "autoResize",
        params.auto_resize,
        "autoResize must be true or false",
        |v| v == "true" || v == "false",
    );

    errors.into_result(())
}

/// Matches `^\d+(%|px)?$`.
fn is_valid_width(width: &str) -> bool {
    let digits = width
        .strip_suffix('%')
        .or_else(|| width.strip_suffix("px"))
        .unwrap_or(width);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// HTML-escapes a string for safe interpolation into markup attributes.
///
/// ```
/// use agendakit_core::validation::escape_html;
///
/// assert_eq!(escape_html("<b>\"Q&A\"</b>"), "&lt;b&gt;&quot;Q&amp;A&quot;&lt;&#x2F;b&gt;");
/// ```
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}
