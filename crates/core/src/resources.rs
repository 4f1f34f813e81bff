//! Upstream resource paths and response envelope helpers.

use serde_json::Value;

/// Cache namespace for upstream API responses.
pub const UPSTREAM_NAMESPACE: &str = "zoom_api";

/// Path of an event's detail resource.
pub fn event_path(event_id: &str) -> String {
    format!("/zoom_events/events/{event_id}")
}

/// Path of an event's session list.
pub fn sessions_path(event_id: &str) -> String {
    format!("/zoom_events/events/{event_id}/sessions")
}

/// Path of an event's speaker list.
pub fn speakers_path(event_id: &str) -> String {
    format!("/zoom_events/events/{event_id}/speakers")
}

/// Takes the array stored under `field`, or an empty list when it is absent
/// or not an array.
///
/// ```
/// use serde_json::json;
/// use agendakit_core::resources::extract_list;
///
/// let envelope = json!({"sessions": [{"id": 1}], "total_records": 1});
/// assert_eq!(extract_list(envelope, "sessions"), vec![json!({"id": 1})]);
/// assert!(extract_list(json!({}), "speakers").is_empty());
/// ```
pub fn extract_list(mut envelope: Value, field: &str) -> Vec<Value> {
    match envelope.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Extracts a human-readable message from an upstream error body.
///
/// Prefers the JSON `message` field, then `reason`, then the raw text.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "reason"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paths() {
        assert_eq!(event_path("e1"), "/zoom_events/events/e1");
        assert_eq!(sessions_path("e1"), "/zoom_events/events/e1/sessions");
        assert_eq!(speakers_path("e1"), "/zoom_events/events/e1/speakers");
    }

    #[test]
    fn test_extract_list_present() {
        let envelope = json!({"speakers": [{"name": "Ada"}, {"name": "Grace"}]});
        let speakers = extract_list(envelope, "speakers");
        assert_eq!(speakers.len(), 2);
        assert_eq!(speakers[1]["name"], "Grace");
    }

    #[test]
    fn test_extract_list_missing_or_wrong_type() {
        assert!(extract_list(json!({"other": []}), "sessions").is_empty());
        assert!(extract_list(json!({"sessions": null}), "sessions").is_empty());
        assert!(extract_list(json!({"sessions": "nope"}), "sessions").is_empty());
        assert!(extract_list(json!([1, 2]), "sessions").is_empty());
    }

    #[test]
    fn test_error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"code":3001,"message":"Event does not exist"}"#),
            "Event does not exist"
        );
        assert_eq!(
            error_message(r#"{"reason":"Invalid client_id or client_secret"}"#),
            "Invalid client_id or client_secret"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(r#"{"code":1}"#), r#"{"code":1}"#);
    }
}
