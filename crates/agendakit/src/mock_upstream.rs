//! In-process stand-in for the upstream token endpoint and events API.
//!
//! Binds `127.0.0.1:0` and counts every token and API request so tests can
//! assert how often the real upstream would have been hit.
//!
//! Routes:
//! - `POST /oauth/token` - expects Basic `client:secret` and an `account_credentials` grant
//! - `GET /v2/zoom_events/events/{id}` and its `/sessions` and `/speakers` children
//!
//! Event id `missing` answers 404, `broken` answers a plain-text 502 and
//! `empty` answers 204 with no body.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

/// `Basic base64("client:secret")`
const EXPECTED_BASIC: &str = "Basic Y2xpZW50OnNlY3JldA==";

#[derive(Default)]
struct MockState {
    token_calls: AtomicUsize,
    api_calls: AtomicUsize,
    reject_tokens: AtomicBool,
    expires_in: AtomicU64,
    last_authorization: Mutex<Option<String>>,
}

#[derive(Deserialize)]
struct TokenForm {
    grant_type: String,
    account_id: String,
}

/// Handle to a running mock upstream.
pub struct MockUpstream {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockUpstream {
    /// Starts the server on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            expires_in: AtomicU64::new(3600),
            ..Default::default()
        });

        let app = Router::new()
            .route("/oauth/token", post(token))
            .route("/v2/zoom_events/events/{id}", get(event))
            .route("/v2/zoom_events/events/{id}/sessions", get(sessions))
            .route("/v2/zoom_events/events/{id}/speakers", get(speakers))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Base URL, e.g. `http://127.0.0.1:43127`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn token_calls(&self) -> usize {
        self.state.token_calls.load(Ordering::SeqCst)
    }

    pub fn api_calls(&self) -> usize {
        self.state.api_calls.load(Ordering::SeqCst)
    }

    /// Makes the token endpoint answer 401 until called again with `false`.
    pub fn reject_tokens(&self, reject: bool) {
        self.state.reject_tokens.store(reject, Ordering::SeqCst);
    }

    /// Lifetime in seconds of tokens issued from now on.
    pub fn set_expires_in(&self, seconds: u64) {
        self.state.expires_in.store(seconds, Ordering::SeqCst);
    }

    /// `Authorization` header of the most recent API request.
    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }
}

async fn token(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Form(form): Form<TokenForm>,
) -> Response {
    let n = state.token_calls.fetch_add(1, Ordering::SeqCst) + 1;

    let basic_ok = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == EXPECTED_BASIC);

    if state.reject_tokens.load(Ordering::SeqCst) || !basic_ok {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"reason": "Invalid client_id or client_secret", "error": "invalid_client"})),
        )
            .into_response();
    }

    if form.grant_type != "account_credentials" || form.account_id != "acct" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"reason": "Unsupported grant type", "error": "unsupported_grant_type"})),
        )
            .into_response();
    }

    Json(json!({
        "access_token": format!("token-{n}"),
        "token_type": "bearer",
        "expires_in": state.expires_in.load(Ordering::SeqCst),
        "scope": "zoom_events:read",
    }))
    .into_response()
}

/// Counts the call and checks the bearer token, or returns the failure response.
fn authorize(state: &MockState, headers: &HeaderMap, id: &str) -> Result<(), Response> {
    state.api_calls.fetch_add(1, Ordering::SeqCst);

    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.last_authorization.lock().unwrap() = authorization.clone();

    if !authorization.is_some_and(|v| v.starts_with("Bearer token-")) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": 124, "message": "Invalid access token."})),
        )
            .into_response());
    }

    match id {
        "missing" => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"code": 3001, "message": "Event does not exist"})),
        )
            .into_response()),
        "broken" => Err((StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()),
        _ => Ok(()),
    }
}

async fn event(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorize(&state, &headers, &id) {
        return response;
    }
    if id == "empty" {
        return StatusCode::NO_CONTENT.into_response();
    }
    Json(json!({"event_id": id, "name": "Mock Conference", "timezone": "UTC"})).into_response()
}

async fn sessions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorize(&state, &headers, &id) {
        return response;
    }
    Json(json!({
        "total_records": 2,
        "sessions": [
            {"session_id": "s1", "name": "Opening Keynote", "event_id": id},
            {"session_id": "s2", "name": "Closing Panel", "event_id": id},
        ],
    }))
    .into_response()
}

async fn speakers(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = authorize(&state, &headers, &id) {
        return response;
    }
    if id == "nospeakers" {
        return Json(json!({"total_records": 0})).into_response();
    }
    Json(json!({
        "total_records": 1,
        "speakers": [{"name": "Ada Lovelace", "event_id": id}],
    }))
    .into_response()
}
