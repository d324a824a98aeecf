use alumnet::config::Config;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Default token seeded by the initial migration (must match m20250712_initial.rs)
const ADMIN_TOKEN: &str = "alumnet_default_token_please_regenerate";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A single pooled connection keeps the in-memory database shared
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.server.secure_cookies = false;

    let state = alumnet::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    alumnet::api::router(state)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Token {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Token {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(app: &Router, username: &str, email: &str, password: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
                "password2": password,
                "first_name": "Test",
                "last_name": "User",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn test_register_then_login_with_uppercase_email() {
    let app = spawn_app().await;

    let registered = register(&app, "alice", "alice@x.com", "pw12345678").await;
    let token = registered["data"]["token"].as_str().unwrap().to_string();
    let account_id = registered["data"]["user"]["id"].as_i64().unwrap();
    assert!(!token.is_empty());

    // Case-insensitive email login resolves to the same account
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "identifier": "ALICE@X.COM", "password": "pw12345678" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["user"]["id"].as_i64().unwrap(), account_id);

    // Repeated logins reuse the same token key
    assert_eq!(body["data"]["token"].as_str().unwrap(), token);

    // Wrong password collapses to the generic invalid-credential error
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "identifier": "alice", "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_case_insensitive_username() {
    let app = spawn_app().await;
    register(&app, "Bob", "bob@x.com", "pw12345678").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "identifier": "bob", "password": "pw12345678" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_duplicate_fields_reported_per_field() {
    let app = spawn_app().await;
    register(&app, "carol", "carol@x.com", "pw12345678").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({
                "username": "carol",
                "email": "carol@x.com",
                "password": "pw12345678",
                "password2": "pw12345678",
                "first_name": "Other",
                "last_name": "Carol",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["errors"]["username"].is_string());
    assert!(body["errors"]["email"].is_string());
}

#[tokio::test]
async fn test_register_password_mismatch() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({
                "username": "dave",
                "email": "dave@x.com",
                "password": "pw12345678",
                "password2": "pw87654321",
                "first_name": "Dave",
                "last_name": "Test",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errors"]["password"], "Passwords must match.");
}

#[tokio::test]
async fn test_current_user_token_identity() {
    let app = spawn_app().await;

    let registered = register(&app, "erin", "erin@x.com", "pw12345678").await;
    let token = registered["data"]["token"].as_str().unwrap().to_string();

    // Valid bearer token resolves the owner
    let response = app
        .clone()
        .oneshot(get_request("/api/auth/user", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["user"]["username"], "erin");
    assert!(body["data"]["alumni"].is_null());

    // Unknown token is a hard 401, never a session fallback
    let response = app
        .clone()
        .oneshot(get_request("/api/auth/user", Some("not-a-real-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // No identity at all
    let response = app
        .clone()
        .oneshot(get_request("/api/auth/user", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deactivated_account_cannot_login() {
    let app = spawn_app().await;

    let registered = register(&app, "frank", "frank@x.com", "pw12345678").await;
    let account_id = registered["data"]["user"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/admin/users/{account_id}/toggle-status"),
            Some(ADMIN_TOKEN),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Correct password, deactivated account
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "identifier": "frank", "password": "pw12345678" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_logout_revokes_token() {
    let app = spawn_app().await;

    let registered = register(&app, "grace", "grace@x.com", "pw12345678").await;
    let token = registered["data"]["token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/logout",
            Some(&token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/api/auth/user", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_create_is_one_to_one() {
    let app = spawn_app().await;

    let registered = register(&app, "alice", "alice@x.com", "pw12345678").await;
    let token = registered["data"]["token"].as_str().unwrap().to_string();

    // No profile yet
    let response = app
        .clone()
        .oneshot(get_request("/api/my-profile", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let profile_body = serde_json::json!({
        "degree": "BS",
        "field_of_study": "Computer Engineering",
        "graduation_year": 2018,
    });

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/my-profile",
            Some(&token),
            profile_body.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    // Name and email defaulted from the account
    assert_eq!(body["data"]["email"], "alice@x.com");
    assert_eq!(body["data"]["first_name"], "Test");

    // Second create always yields a structured conflict, never a second row
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/my-profile", Some(&token), profile_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(get_request("/api/my-profile", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_profile_field_of_study_validation() {
    let app = spawn_app().await;

    let registered = register(&app, "henry", "henry@x.com", "pw12345678").await;
    let token = registered["data"]["token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/my-profile",
            Some(&token),
            serde_json::json!({
                "degree": "BA",
                "field_of_study": "History",
                "graduation_year": 2012,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Whitespace-only is rejected
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/my-profile",
            Some(&token),
            serde_json::json!({ "field_of_study": "   " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["errors"]["field_of_study"].is_string());

    // Any non-blank value is accepted, curated list or not
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/my-profile",
            Some(&token),
            serde_json::json!({ "field_of_study": "Basket Weaving" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["field_of_study"], "Basket Weaving");
}

#[tokio::test]
async fn test_account_update_rejects_duplicates() {
    let app = spawn_app().await;

    register(&app, "iris", "iris@x.com", "pw12345678").await;
    let registered = register(&app, "jack", "jack@x.com", "pw12345678").await;
    let token = registered["data"]["token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/auth/account",
            Some(&token),
            serde_json::json!({ "username": "iris" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["errors"]["username"].is_string());

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/auth/account",
            Some(&token),
            serde_json::json!({ "first_name": "Jacques" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["first_name"], "Jacques");
}

#[tokio::test]
async fn test_change_password_flow() {
    let app = spawn_app().await;

    let registered = register(&app, "kate", "kate@x.com", "pw12345678").await;
    let token = registered["data"]["token"].as_str().unwrap().to_string();

    // Wrong current password
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/password",
            Some(&token),
            serde_json::json!({
                "current_password": "nope",
                "new_password": "newpassword1",
                "new_password2": "newpassword1",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Mismatched pair
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/password",
            Some(&token),
            serde_json::json!({
                "current_password": "pw12345678",
                "new_password": "newpassword1",
                "new_password2": "newpassword2",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Valid change, then the old password stops working
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/password",
            Some(&token),
            serde_json::json!({
                "current_password": "pw12345678",
                "new_password": "newpassword1",
                "new_password2": "newpassword1",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "identifier": "kate", "password": "pw12345678" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "identifier": "kate", "password": "newpassword1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_site_stats_is_public() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/api/stats", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["alumni_count"], 0);
}

#[tokio::test]
async fn test_protected_routes_require_identity() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/api/alumni", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get_request("/api/alumni", Some(ADMIN_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
