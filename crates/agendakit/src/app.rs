use std::time::Duration;

use axum::{http::StatusCode, middleware, routing::get, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    handlers::{
        api::{event_details, sessions, speakers},
        embed::embed_code,
        fallback::not_found,
        health::health,
        widget::{demo_config, root, widget_config},
    },
    rate_limit::rate_limit,
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    // Rate limiting applies to every /api request
    let api_routes = Router::new()
        .route("/sessions/{event_id}", get(sessions))
        .route("/events/{event_id}", get(event_details))
        .route("/speakers/{event_id}", get(speakers))
        .route("/embed-code", get(embed_code))
        .route("/widget-config", get(widget_config))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/demo/config.js", get(demo_config))
        .nest("/api", api_routes)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::{
        body::Body,
        extract::ConnectInfo,
        http::{header, Request, Response},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::cache::{test_cache_config, TieredCache};
    use crate::config::{tests::test_config, Config};
    use crate::mock_upstream::MockUpstream;

    fn state_with(config: Config) -> AppState {
        let cache = Arc::new(TieredCache::new(None, test_cache_config(100)).unwrap());
        AppState::new(config, cache)
    }

    async fn setup() -> (MockUpstream, Router) {
        let upstream = MockUpstream::start().await;
        let app = create_app(state_with(test_config(&upstream.url())));
        (upstream, app)
    }

    async fn get(app: &Router, uri: &str) -> Response<Body> {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json(response: Response<Body>) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_sessions_proxy_and_cache() {
        let (upstream, app) = setup().await;

        let response = get(&app, "/api/sessions/evt123").await;
        assert_eq!(response.status(), StatusCode::OK);
        let sessions = json(response).await;
        assert_eq!(sessions.as_array().unwrap().len(), 2);
        assert_eq!(sessions[0]["name"], "Opening Keynote");

        let response = get(&app, "/api/sessions/evt123").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(upstream.api_calls(), 1);
        assert_eq!(upstream.token_calls(), 1);
    }

    #[tokio::test]
    async fn test_event_details() {
        let (_upstream, app) = setup().await;

        let response = get(&app, "/api/events/evt123").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["event_id"], "evt123");
    }

    #[tokio::test]
    async fn test_speakers() {
        let (_upstream, app) = setup().await;

        let response = get(&app, "/api/speakers/evt123").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await[0]["name"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_invalid_event_id_rejected_before_upstream() {
        let (upstream, app) = setup().await;

        let response = get(&app, "/api/sessions/bad@id").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["error"], "Invalid input parameters");
        assert_eq!(body["details"][0]["path"], "eventId");
        assert_eq!(body["details"][0]["location"], "params");
        assert_eq!(upstream.api_calls(), 0);
        assert_eq!(upstream.token_calls(), 0);
    }

    #[tokio::test]
    async fn test_overlong_event_id_rejected() {
        let (upstream, app) = setup().await;

        let response = get(&app, &format!("/api/events/{}", "a".repeat(51))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(upstream.api_calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_not_found_is_propagated() {
        let (_upstream, app) = setup().await;

        let response = get(&app, "/api/events/missing").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json(response).await;
        assert_eq!(body["error"], "Failed to fetch event details");
        assert_eq!(body["message"], "Event does not exist");
        assert_eq!(body["eventId"], "missing");
    }

    #[tokio::test]
    async fn test_token_failure_maps_to_error_response() {
        let (upstream, app) = setup().await;
        upstream.reject_tokens(true);

        let response = get(&app, "/api/speakers/evt123").await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json(response).await;
        assert_eq!(body["error"], "Failed to fetch speakers");
        assert_eq!(upstream.api_calls(), 0);
    }

    #[tokio::test]
    async fn test_embed_code() {
        let (upstream, app) = setup().await;

        let response = get(&app, "/api/embed-code?eventId=evt123&theme=light&layout=grid").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        let embed = body["embedCode"].as_str().unwrap();
        assert!(embed.contains("evt123"));
        assert!(embed.contains("<iframe"));
        assert_eq!(body["configuration"]["theme"], "light");
        assert_eq!(body["configuration"]["layout"], "grid");
        assert_eq!(body["configuration"]["title"], "Event Agenda");
        assert!(body["widgetUrl"]
            .as_str()
            .unwrap()
            .starts_with("https://widgets.example.com/agenda/?eventId=evt123"));
        assert_eq!(upstream.api_calls(), 0);
    }

    #[tokio::test]
    async fn test_embed_code_validation_errors() {
        let (_upstream, app) = setup().await;

        let response = get(
            &app,
            "/api/embed-code?eventId=invalid%40event%23id&theme=neon&height=50",
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["error"], "Invalid input parameters");
        let paths: Vec<&str> = body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["path"].as_str().unwrap())
            .collect();
        assert_eq!(paths, vec!["eventId", "theme", "height"]);
    }

    #[tokio::test]
    async fn test_embed_code_without_event_id() {
        let (_upstream, app) = setup().await;

        let response = get(&app, "/api/embed-code").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "Missing eventId parameter");
    }

    #[tokio::test]
    async fn test_embed_code_uses_default_event_id() {
        let upstream = MockUpstream::start().await;
        let mut config = test_config(&upstream.url());
        config.default_event_id = Some("evt_default".to_string());
        let app = create_app(state_with(config));

        let response = get(&app, "/api/embed-code").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["configuration"]["eventId"], "evt_default");
    }

    #[tokio::test]
    async fn test_widget_config() {
        let (_upstream, app) = setup().await;

        let response = get(&app, "/api/widget-config").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["domain"], "https://widgets.example.com");
        assert_eq!(body["apiEndpoint"], "https://widgets.example.com/api");
        assert_eq!(body["defaultEventId"], Value::Null);
        assert_eq!(body["availableThemes"].as_array().unwrap().len(), 3);
        assert_eq!(body["supportedParams"].as_array().unwrap().len(), 13);
        assert_eq!(body["cacheInfo"]["memory"]["maxSize"], 100);
    }

    #[tokio::test]
    async fn test_health() {
        let (_upstream, app) = setup().await;

        let response = get(&app, "/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["environment"], "test");
        assert_eq!(body["widget_url"], "https://widgets.example.com/agenda/");
        assert_eq!(body["demo_url"], "https://widgets.example.com/demo/");
        assert_eq!(body["cache_health"]["redis"]["status"], "disconnected");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_unknown_route_returns_descriptor() {
        let (_upstream, app) = setup().await;

        for uri in ["/nope", "/api/nope?x=1"] {
            let response = get(&app, uri).await;

            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let body = json(response).await;
            assert_eq!(body["error"], "Endpoint not found");
            assert_eq!(body["message"], format!("Path {uri} does not exist"));
            assert!(body["availableEndpoints"].as_array().unwrap().len() > 1);
        }
    }

    #[tokio::test]
    async fn test_root_redirects_to_demo() {
        let (_upstream, app) = setup().await;

        let response = get(&app, "/").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/demo/");
    }

    #[tokio::test]
    async fn test_demo_config_script() {
        let (_upstream, app) = setup().await;

        let response = get(&app, "/demo/config.js").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/javascript"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let script = String::from_utf8(body.to_vec()).unwrap();
        assert!(script.starts_with("window.EMBED_CONFIG = {"));
        assert!(script.contains("\"NO_EVENT_ID_FROM_ENV\""));
        assert!(script.contains("apiServerBase: \"https://widgets.example.com\""));
    }

    #[tokio::test]
    async fn test_rate_limit_returns_429() {
        let upstream = MockUpstream::start().await;
        let mut config = test_config(&upstream.url());
        config.rate_limit.max_requests = 2;
        let app = create_app(state_with(config));

        for _ in 0..2 {
            let response = get(&app, "/api/widget-config").await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = get(&app, "/api/widget-config").await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "900");
        let body = json(response).await;
        assert_eq!(body["error"], "Too many requests");
        assert_eq!(body["retryAfter"], 900);

        // Routes outside /api are not limited.
        assert_eq!(get(&app, "/health").await.status(), StatusCode::OK);
    }

    fn widget_config_from(peer: [u8; 4], forwarded_for: &str) -> Request<Body> {
        let mut request = Request::builder()
            .uri("/api/widget-config")
            .header("x-forwarded-for", forwarded_for)
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
        request
    }

    async fn status(app: &Router, request: Request<Body>) -> StatusCode {
        app.clone().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_rate_limit_is_per_client() {
        let upstream = MockUpstream::start().await;
        let mut config = test_config(&upstream.url());
        config.rate_limit.max_requests = 1;
        let app = create_app(state_with(config));

        let first = status(&app, widget_config_from([198, 51, 100, 1], "203.0.113.1")).await;
        let repeat = status(&app, widget_config_from([198, 51, 100, 1], "203.0.113.2")).await;
        let other = status(&app, widget_config_from([198, 51, 100, 2], "203.0.113.1")).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(repeat, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(other, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rate_limit_keys_on_forwarded_for_behind_trusted_proxy() {
        let upstream = MockUpstream::start().await;
        let mut config = test_config(&upstream.url());
        config.rate_limit.max_requests = 1;
        config.rate_limit.trust_proxy = true;
        let app = create_app(state_with(config));

        let proxy = [10, 0, 0, 1];
        let first = status(&app, widget_config_from(proxy, "198.51.100.1")).await;
        let repeat = status(&app, widget_config_from(proxy, "198.51.100.1")).await;
        let other = status(&app, widget_config_from(proxy, "198.51.100.2")).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(repeat, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(other, StatusCode::OK);
    }
}
