//! End-to-end behavior of the session client against a live HTTP server.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::routing::{delete, get, post};
use chamafrete::state::session::{TOKEN_KEY, USER_KEY};
use chamafrete::{
    ApiClient, ApiError, ClientConfig, KeyValueStore, MemoryNavigator, MemoryStore, SessionState, create_client,
};
use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::{Value, json};

// =============================================================================
// SERVER
// =============================================================================

async fn echo(headers: HeaderMap) -> Json<Value> {
    let header = |name: HeaderName| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    Json(json!({
        "authorization": header(AUTHORIZATION),
        "content_type": header(CONTENT_TYPE),
    }))
}

async fn unauthorized() -> (StatusCode, &'static str) {
    (StatusCode::UNAUTHORIZED, "token expired")
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(2)).await;
    "late"
}

fn app() -> Router {
    Router::new()
        .route("/freights", get(echo).post(echo).delete(echo))
        .route("/login", post(echo))
        .route("/v2/login", get(echo))
        .route("/register", post(echo))
        .route("/reset-password", post(echo))
        .route("/dashboard/data", get(unauthorized))
        .route("/boom", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
        .route("/forbidden", get(|| async { StatusCode::FORBIDDEN }))
        .route("/ads/{id}", delete(|| async { StatusCode::NO_CONTENT }))
        .route("/upload", post(echo))
        .route("/slow", get(slow))
}

async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app()).await.unwrap();
    });
    format!("http://{addr}")
}

// =============================================================================
// CLIENT
// =============================================================================

struct Harness {
    api: ApiClient,
    store: Arc<MemoryStore>,
    nav: Arc<MemoryNavigator>,
}

fn harness(base_url: &str, location: &str, config: ClientConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let nav = Arc::new(MemoryNavigator::at(location));
    let api = create_client(config.with_base_url(base_url), store.clone(), nav.clone()).unwrap();
    Harness { api, store, nav }
}

async fn logged_in(location: &str) -> Harness {
    let base = spawn_server().await;
    let h = harness(&base, location, ClientConfig::default());
    h.api.session().establish("abc123", &json!({ "id": 42, "name": "Transportadora Sul" })).unwrap();
    h
}

fn authorization(body: &Value) -> Option<&str> {
    body["authorization"].as_str()
}

// =============================================================================
// REQUEST AUTHENTICATION
// =============================================================================

#[tokio::test]
async fn token_is_sent_to_private_routes() {
    let h = logged_in("/dashboard").await;
    let body: Value = h.api.get("/freights").await.unwrap();
    assert_eq!(authorization(&body), Some("Bearer abc123"));
}

#[tokio::test]
async fn content_type_is_only_sent_with_a_body() {
    let h = logged_in("/dashboard").await;

    let body: Value = h.api.get("/freights").await.unwrap();
    assert!(body["content_type"].is_null());
    let body: Value = h.api.delete("/freights").await.unwrap();
    assert!(body["content_type"].is_null());

    let body: Value = h.api.post("/freights", &json!({ "origin": "Curitiba" })).await.unwrap();
    assert_eq!(body["content_type"], "application/json");
}

#[tokio::test]
async fn blank_stored_token_sends_no_header() {
    let base = spawn_server().await;
    let h = harness(&base, "/dashboard", ClientConfig::default());
    h.store.set(TOKEN_KEY, "  ").unwrap();

    let body: Value = h.api.get("/freights").await.unwrap();
    assert_eq!(authorization(&body), None);
    assert_eq!(h.api.session_state(), SessionState::Unauthenticated);
}

// =============================================================================
// CUSTOM REQUESTS
// =============================================================================

#[tokio::test]
async fn custom_request_carries_token() {
    let h = logged_in("/dashboard").await;
    let response = h
        .api
        .request(Method::GET, "/freights")
        .header(ACCEPT, HeaderValue::from_static("application/json"))
        .query(&[("page", "2")])
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(authorization(&body), Some("Bearer abc123"));
}

#[tokio::test]
async fn custom_request_runs_the_session_guard() {
    let h = logged_in("/dashboard").await;
    let err = h.api.request(Method::GET, "/dashboard/data").send().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(h.store.get(USER_KEY).unwrap(), None);
    assert_eq!(h.nav.redirects(), vec!["/login".to_owned()]);
}

#[tokio::test]
async fn custom_request_skips_token_on_public_route() {
    let h = logged_in("/login").await;
    let body: Value = h
        .api
        .request(Method::POST, "/login")
        .json(&json!({ "email": "a@b.c" }))
        .send_json()
        .await
        .unwrap();
    assert_eq!(authorization(&body), None);
    assert_eq!(body["content_type"], "application/json");
}

#[tokio::test]
async fn token_is_withheld_from_public_routes() {
    let h = logged_in("/login").await;
    for path in ["/login", "/register", "/reset-password"] {
        let body: Value = h.api.post(path, &json!({ "email": "ana@chamafrete.test" })).await.unwrap();
        assert_eq!(authorization(&body), None, "{path}");
    }
    let body: Value = h.api.get("/v2/login").await.unwrap();
    assert_eq!(authorization(&body), None);
}

#[tokio::test]
async fn login_succeeds_without_a_session() {
    let base = spawn_server().await;
    let h = harness(&base, "/login", ClientConfig::default());
    let body: Value = h.api.post("/login", &json!({ "email": "a@b.c", "password": "x" })).await.unwrap();
    assert_eq!(authorization(&body), None);
    assert_eq!(h.api.session_state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn no_token_means_no_header() {
    let base = spawn_server().await;
    let h = harness(&base, "/dashboard", ClientConfig::default());
    let body: Value = h.api.get("/freights").await.unwrap();
    assert_eq!(authorization(&body), None);
}

#[tokio::test]
async fn call_site_content_type_overrides_default() {
    let h = logged_in("/profile").await;
    let form = reqwest::multipart::Form::new().text("document", "cnh.pdf");
    let body: Value = h.api.post_multipart("/upload", form).await.unwrap();
    let content_type = body["content_type"].as_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"), "{content_type}");
    assert_eq!(authorization(&body), Some("Bearer abc123"));
}

#[tokio::test]
async fn empty_success_body_decodes_as_unit() {
    let h = logged_in("/ads").await;
    h.api.delete::<()>("/ads/7").await.unwrap();
}

// =============================================================================
// SESSION GUARD
// =============================================================================

#[tokio::test]
async fn unauthorized_clears_session_and_redirects_to_login() {
    let h = logged_in("/dashboard").await;
    let err = h.api.get::<Value>("/dashboard/data").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(matches!(&err, ApiError::Status { body, .. } if body == "token expired"));
    assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(h.store.get(USER_KEY).unwrap(), None);
    assert_eq!(h.nav.redirects(), vec!["/login".to_owned()]);
    assert_eq!(h.api.session_state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn unauthorized_on_public_page_does_not_redirect() {
    for page in ["/login", "/register", "/forgot-password"] {
        let h = logged_in(page).await;
        let err = h.api.get::<Value>("/dashboard/data").await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
        assert!(h.nav.redirects().is_empty(), "{page}");
    }
}

#[tokio::test]
async fn other_error_statuses_leave_session_alone() {
    let h = logged_in("/dashboard").await;

    let err = h.api.get::<Value>("/boom").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    let err = h.api.get::<Value>("/forbidden").await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    let err = h.api.get::<Value>("/missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    assert_eq!(h.store.get(TOKEN_KEY).unwrap().as_deref(), Some("abc123"));
    assert!(h.store.get(USER_KEY).unwrap().is_some());
    assert!(h.nav.redirects().is_empty());
}

#[tokio::test]
async fn concurrent_unauthorized_responses_redirect_once() {
    let h = logged_in("/dashboard").await;
    let (a, b) = tokio::join!(h.api.get::<Value>("/dashboard/data"), h.api.get::<Value>("/dashboard/data"));

    assert!(a.unwrap_err().is_unauthorized());
    assert!(b.unwrap_err().is_unauthorized());
    assert_eq!(h.store.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(h.nav.redirects().len(), 1);
}

#[tokio::test]
async fn explicit_logout_drops_credentials() {
    let h = logged_in("/dashboard").await;
    h.api.logout().unwrap();

    let body: Value = h.api.get("/freights").await.unwrap();
    assert_eq!(authorization(&body), None);
    assert!(h.nav.redirects().is_empty());
}

// =============================================================================
// TRANSPORT
// =============================================================================

#[tokio::test]
async fn slow_response_times_out_without_touching_session() {
    let base = spawn_server().await;
    let config = ClientConfig { timeout: Duration::from_millis(200), ..ClientConfig::default() };
    let h = harness(&base, "/dashboard", config);
    h.api.session().establish("abc123", &json!({})).unwrap();

    let err = h.api.get::<String>("/slow").await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout { .. }), "{err:?}");
    assert_eq!(h.store.get(TOKEN_KEY).unwrap().as_deref(), Some("abc123"));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let h = harness(&format!("http://{addr}"), "/dashboard", ClientConfig::default());
    h.api.session().establish("abc123", &json!({})).unwrap();

    let err = h.api.get::<Value>("/freights").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
    assert_eq!(h.store.get(TOKEN_KEY).unwrap().as_deref(), Some("abc123"));
    assert!(h.nav.redirects().is_empty());
}
