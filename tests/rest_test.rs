use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use credential_auth::{rest, store::SqliteUserStore, token::JwtSigner, AppState};
use serde_json::{json, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

async fn app_with_pool() -> (Router, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqliteUserStore::new(pool.clone());
    store.ensure_schema().await.unwrap();
    let app = rest::router(AppState::new(store, JwtSigner::new(SECRET)));
    (app, pool)
}

async fn app() -> Router {
    app_with_pool().await.0
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn subject_of(body: &Value) -> i64 {
    let token = body["access_token"].as_str().unwrap();
    JwtSigner::new(SECRET).verify(token).unwrap().sub
}

#[tokio::test]
async fn signup_returns_created_with_token() {
    let app = app().await;

    let (status, body) = post(
        &app,
        "/auth/signup",
        json!({"email": "a@x.com", "password": "secret1"}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let claims = JwtSigner::new(SECRET)
        .verify(body["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.sub, 1);
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.exp - claims.iat, 900);
}

#[tokio::test]
async fn full_flow() {
    let app = app().await;
    let creds = json!({"email": "a@x.com", "password": "secret1"});

    let (status, signup) = post(&app, "/auth/signup", creds.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post(&app, "/auth/signup", creds.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "Credential taken"}));

    let (status, body) = post(
        &app,
        "/auth/signin",
        json!({"email": "a@x.com", "password": "wrong"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "Invalid Credentials"}));

    let (status, signin) = post(&app, "/auth/signin", creds).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subject_of(&signin), subject_of(&signup));
}

#[tokio::test]
async fn unknown_email_matches_wrong_password_response() {
    let app = app().await;
    post(
        &app,
        "/auth/signup",
        json!({"email": "a@x.com", "password": "secret1"}),
    )
    .await;

    let unknown = post(
        &app,
        "/auth/signin",
        json!({"email": "ghost@x.com", "password": "secret1"}),
    )
    .await;
    let wrong = post(
        &app,
        "/auth/signin",
        json!({"email": "a@x.com", "password": "nope"}),
    )
    .await;

    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn empty_fields_are_bad_requests() {
    let app = app().await;

    let (status, _) = post(&app, "/auth/signup", json!({"email": "", "password": "pw"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &app,
        "/auth/signin",
        json!({"email": "a@x.com", "password": ""}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn email_is_trimmed_before_storage() {
    let app = app().await;

    let (status, signup) = post(
        &app,
        "/auth/signup",
        json!({"email": "  a@x.com ", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post(
        &app,
        "/auth/signup",
        json!({"email": "a@x.com", "password": "other"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "Credential taken"}));

    let (status, signin) = post(
        &app,
        "/auth/signin",
        json!({"email": "a@x.com", "password": "secret1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subject_of(&signin), subject_of(&signup));
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let app = app().await;

    let (status, body) = post(&app, "/auth/signup", json!({"email": "a@x.com"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("password"));

    let request = Request::builder()
        .method("POST")
        .uri("/auth/signin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/auth/signup")
        .body(Body::from(r#"{"email":"a@x.com","password":"pw"}"#))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn database_failure_is_a_generic_500() {
    let (app, pool) = app_with_pool().await;
    pool.close().await;

    let creds = json!({"email": "a@x.com", "password": "secret1"});
    for uri in ["/auth/signup", "/auth/signin"] {
        let (status, body) = post(&app, uri, creds.clone()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Database error"}));
    }
}
