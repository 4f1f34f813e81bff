/// Product-wide prefix shared by every key this service writes.
///
/// Keeps our entries apart from unrelated users of the same Redis database.
pub const PRODUCT_NAMESPACE: &str = "agenda_widget";

/// Returns the fully qualified cache key for `key` inside `namespace`.
///
/// # Examples
///
/// ```
/// use agendakit_core::cache::namespaced_key;
///
/// assert_eq!(
///     namespaced_key("zoom_api", "_zoom_events_events_abc"),
///     "agenda_widget:zoom_api:_zoom_events_events_abc"
/// );
/// ```
pub fn namespaced_key(namespace: &str, key: &str) -> String {
    format!("{PRODUCT_NAMESPACE}:{namespace}:{key}")
}

/// Returns the key prefix covering every entry of `namespace`.
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{PRODUCT_NAMESPACE}:{namespace}:")
}

/// Returns the key prefix covering every entry this service owns.
pub fn product_prefix() -> String {
    format!("{PRODUCT_NAMESPACE}:")
}

/// Derives a cache key from an upstream request path.
///
/// Path separators are replaced by `_` so the key never contains `/`.
///
/// ```
/// use agendakit_core::cache::resource_key;
///
/// assert_eq!(
///     resource_key("/zoom_events/events/evt1/sessions"),
///     "_zoom_events_events_evt1_sessions"
/// );
/// ```
pub fn resource_key(path: &str) -> String {
    path.replace('/', "_")
}

/// Escapes Redis glob metacharacters so `prefix` matches literally.
pub fn glob_escape(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
