//! Web API Authentication Tests
//!
//! Integration tests for registration, login, token refresh, logout and the
//! bearer/scope guard.

use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use filedock::auth::{Claims, TokenService, TokenType};
use filedock::db::{Scopes, UserRepository};
use filedock::web::{create_router, AppState};
use filedock::{Config, Database};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

const SECRET: &str = "test-secret-key-for-testing-only";
const COOKIE: &str = "filedock_refresh";

/// Create a test configuration rooted in a temporary directory.
fn create_test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.security.secret_key = SECRET.to_string();
    config.storage.root = dir.path().join("folders").to_string_lossy().into_owned();
    config
}

/// Create a test server with an in-memory database.
async fn create_test_server() -> (TestServer, Arc<AppState>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Arc::new(create_test_config(&dir));

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let app_state = Arc::new(AppState::new(db, config));

    let router = create_router(app_state.clone());
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, app_state, dir)
}

/// Helper to register a test user.
async fn register_user(server: &TestServer, username: &str, password: &str) {
    server
        .post("/register")
        .json(&json!({
            "username": username,
            "password": password,
            "full_name": "Test User"
        }))
        .await
        .assert_status_ok();
}

/// Helper to login and return the access token.
async fn login_user(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/login")
        .form(&[("username", username), ("password", password)])
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["access_token"].as_str().unwrap().to_string()
}

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let (server, state, _dir) = create_test_server().await;

    let response = server
        .post("/register")
        .json(&json!({
            "username": "testuser",
            "password": "password123",
            "full_name": "Test User",
            "age": 30
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "User successfully created");

    let user = UserRepository::new(state.db.pool())
        .get_by_username("testuser")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.age, Some(30));
    assert!(state.storage.user_dir(user.id).is_dir());
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let (server, state, _dir) = create_test_server().await;

    register_user(&server, "testuser", "password123").await;

    let response = server
        .post("/register")
        .json(&json!({
            "username": "testuser",
            "password": "password456",
            "full_name": "Someone Else"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let count = UserRepository::new(state.db.pool())
        .count_by_username("testuser")
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_register_validation() {
    let (server, _state, _dir) = create_test_server().await;

    let response = server
        .post("/register")
        .json(&json!({
            "username": "u".repeat(64),
            "password": "password123",
            "full_name": "Too Long"
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["username"].is_array());

    let response = server
        .post("/register")
        .json(&json!({
            "username": "shortpw",
            "password": "short",
            "full_name": "Short Password"
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_register_malformed_json() {
    let (server, _state, _dir) = create_test_server().await;

    let response = server
        .post("/register")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let (server, _state, _dir) = create_test_server().await;
    register_user(&server, "testuser", "password123").await;

    let response = server
        .post("/login")
        .form(&[("username", "testuser"), ("password", "password123")])
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["access_token"].is_string());
    assert_eq!(body["token_type"], "bearer");

    let cookie = response.cookie(COOKIE);
    assert!(!cookie.value().is_empty());
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.path(), Some("/token/refresh"));
    assert_eq!(cookie.domain(), Some("localhost"));
    assert!(cookie.to_string().contains("SameSite=None"));
    assert_eq!(
        cookie.max_age().map(|age| age.whole_seconds()),
        Some(43200 * 60)
    );
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (server, _state, _dir) = create_test_server().await;
    register_user(&server, "testuser", "password123").await;

    let response = server
        .post("/login")
        .form(&[("username", "testuser"), ("password", "wrongpassword")])
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.maybe_cookie(COOKIE).is_none());
}

#[tokio::test]
async fn test_login_nonexistent_user() {
    let (server, _state, _dir) = create_test_server().await;

    let response = server
        .post("/login")
        .form(&[("username", "nobody"), ("password", "password123")])
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Token Refresh Tests
// ============================================================================

#[tokio::test]
async fn test_refresh_with_cookie() {
    let (server, _state, _dir) = create_test_server().await;
    register_user(&server, "testuser", "password123").await;

    let login = server
        .post("/login")
        .form(&[("username", "testuser"), ("password", "password123")])
        .await;
    let refresh_cookie = login.cookie(COOKIE);

    let response = server
        .post("/token/refresh")
        .add_cookie(refresh_cookie)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["token_type"], "bearer");
    let access_token = body["access_token"].as_str().unwrap();
    assert!(!response.cookie(COOKIE).value().is_empty());

    server
        .get("/folder")
        .add_header(AUTHORIZATION, format!("Bearer {}", access_token))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_refresh_without_cookie() {
    let (server, _state, _dir) = create_test_server().await;

    let response = server.post("/token/refresh").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let (server, _state, _dir) = create_test_server().await;
    register_user(&server, "testuser", "password123").await;

    let login = server
        .post("/login")
        .form(&[("username", "testuser"), ("password", "password123")])
        .await;
    let access_token = login.json::<Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let mut cookie = login.cookie(COOKIE);
    cookie.set_value(access_token);
    let response = server.post("/token/refresh").add_cookie(cookie).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_is_not_a_bearer_token() {
    let (server, _state, _dir) = create_test_server().await;
    register_user(&server, "testuser", "password123").await;

    let login = server
        .post("/login")
        .form(&[("username", "testuser"), ("password", "password123")])
        .await;
    let refresh_token = login.cookie(COOKIE).value().to_string();

    server
        .get("/folder")
        .add_header(AUTHORIZATION, format!("Bearer {}", refresh_token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Logout Tests
// ============================================================================

#[tokio::test]
async fn test_logout_clears_cookie() {
    let (server, _state, _dir) = create_test_server().await;
    register_user(&server, "testuser", "password123").await;
    let access_token = login_user(&server, "testuser", "password123").await;

    let response = server
        .post("/logout")
        .add_header(AUTHORIZATION, format!("Bearer {}", access_token))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({}));

    let cookie = response.cookie(COOKIE);
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.path(), Some("/token/refresh"));
    assert_eq!(cookie.max_age().map(|age| age.whole_seconds()), Some(0));
}

#[tokio::test]
async fn test_logout_requires_token() {
    let (server, _state, _dir) = create_test_server().await;

    server
        .post("/logout")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Guard Tests
// ============================================================================

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (server, _state, _dir) = create_test_server().await;

    let response = server.get("/folder").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.header(WWW_AUTHENTICATE), "Bearer");
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_malformed_header_is_unauthorized() {
    let (server, _state, _dir) = create_test_server().await;

    server
        .get("/folder")
        .add_header(AUTHORIZATION, "Token abc")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .get("/folder")
        .add_header(AUTHORIZATION, "Bearer not.a.jwt")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_secret_is_unauthorized() {
    let (server, state, _dir) = create_test_server().await;
    register_user(&server, "testuser", "password123").await;

    let user = UserRepository::new(state.db.pool())
        .get_by_username("testuser")
        .await
        .unwrap()
        .unwrap();
    let forged = TokenService::new("another-secret", 60, 60).issue(&user).unwrap();

    server
        .get("/folder")
        .add_header(AUTHORIZATION, format!("Bearer {}", forged.access_token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let (server, _state, _dir) = create_test_server().await;
    register_user(&server, "testuser", "password123").await;

    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "testuser".to_string(),
        scopes: vec!["*".to_string()],
        typ: TokenType::Access,
        iat: now - 7200,
        exp: now - 60,
        jti: "expired".to_string(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    server
        .get("/folder")
        .add_header(AUTHORIZATION, format!("Bearer {}", token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_user_is_unauthorized() {
    let (server, state, _dir) = create_test_server().await;
    register_user(&server, "testuser", "password123").await;
    let access_token = login_user(&server, "testuser", "password123").await;

    let repo = UserRepository::new(state.db.pool());
    let user = repo.get_by_username("testuser").await.unwrap().unwrap();
    repo.delete(user.id).await.unwrap();

    server
        .get("/folder")
        .add_header(AUTHORIZATION, format!("Bearer {}", access_token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_read_scope_cannot_write() {
    let (server, state, _dir) = create_test_server().await;
    register_user(&server, "reader", "password123").await;

    let repo = UserRepository::new(state.db.pool());
    let user = repo.get_by_username("reader").await.unwrap().unwrap();
    repo.set_scopes(user.id, &Scopes::new(["read"])).await.unwrap();
    let access_token = login_user(&server, "reader", "password123").await;

    server
        .get("/folder")
        .add_header(AUTHORIZATION, format!("Bearer {}", access_token))
        .await
        .assert_status_ok();

    let response = server
        .post("/folder")
        .add_header(AUTHORIZATION, format!("Bearer {}", access_token))
        .json(&json!({"name": "Docs"}))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
}

#[tokio::test]
async fn test_admin_scope_bypasses_checks() {
    let (server, state, _dir) = create_test_server().await;
    register_user(&server, "boss", "password123").await;

    let repo = UserRepository::new(state.db.pool());
    let user = repo.get_by_username("boss").await.unwrap().unwrap();
    repo.set_scopes(user.id, &Scopes::new(["admin"])).await.unwrap();
    let access_token = login_user(&server, "boss", "password123").await;

    server
        .post("/folder")
        .add_header(AUTHORIZATION, format!("Bearer {}", access_token))
        .json(&json!({"name": "Docs"}))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::new(filedock::web::create_health_router()).unwrap();

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}
