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

async fn create_alumni(app: &Router, email: &str, status: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/alumni",
            Some(ADMIN_TOKEN),
            serde_json::json!({
                "first_name": "Sample",
                "last_name": "Person",
                "email": email,
                "degree": "BS",
                "field_of_study": "Computer Engineering",
                "graduation_year": 2019,
                "status": status,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_bulk_status_update_count_and_single_audit_entry() {
    let app = spawn_app().await;

    create_alumni(&app, "a1@x.com", "inactive").await;
    create_alumni(&app, "a2@x.com", "inactive").await;
    create_alumni(&app, "a3@x.com", "active").await;

    let response = app
        .clone()
        .oneshot(get_request("/api/admin/audit-logs", Some(ADMIN_TOKEN)))
        .await
        .unwrap();
    let before = body_json(response).await["data"]["total"].as_u64().unwrap();

    // Exactly the rows that were inactive immediately before the call
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/alumni/bulk-action",
            Some(ADMIN_TOKEN),
            serde_json::json!({ "action": "set_status", "from": "inactive", "to": "active" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["updated"], 2);

    // Exactly one new audit entry describing the bulk action
    let response = app
        .clone()
        .oneshot(get_request("/api/admin/audit-logs", Some(ADMIN_TOKEN)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"].as_u64().unwrap(), before + 1);
    let title = body["data"]["items"][0]["title"].as_str().unwrap();
    assert!(title.starts_with("Alumni Bulk Action:"), "title was {title}");
    let description = body["data"]["items"][0]["description"].as_str().unwrap();
    assert!(description.contains("admin"));

    // Running it again finds nothing left to update
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/alumni/bulk-action",
            Some(ADMIN_TOKEN),
            serde_json::json!({ "action": "set_status", "from": "inactive", "to": "active" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["updated"], 0);
}

#[tokio::test]
async fn test_bulk_action_rejects_unknown_action() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/alumni/bulk-action",
            Some(ADMIN_TOKEN),
            serde_json::json!({ "action": "make_famous" }),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_admin_endpoints_require_staff() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({
                "username": "plain",
                "email": "plain@x.com",
                "password": "pw12345678",
                "password2": "pw12345678",
                "first_name": "Plain",
                "last_name": "User",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let token = body_json(response).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    for uri in [
        "/api/admin/users",
        "/api/admin/audit-logs",
        "/api/admin/export/alumni",
    ] {
        let response = app
            .clone()
            .oneshot(get_request(uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "uri {uri}");
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/admin/users", Some(ADMIN_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_toggle_user_status_records_audit_diff() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            serde_json::json!({
                "username": "toggle_me",
                "email": "toggle@x.com",
                "password": "pw12345678",
                "password2": "pw12345678",
                "first_name": "Toggle",
                "last_name": "Me",
            }),
        ))
        .await
        .unwrap();
    let account_id = body_json(response).await["data"]["user"]["id"]
        .as_i64()
        .unwrap();

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
    let body = body_json(response).await;
    assert_eq!(body["data"]["is_active"], false);

    let response = app
        .clone()
        .oneshot(get_request("/api/admin/audit-logs", Some(ADMIN_TOKEN)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let entry = &body["data"]["items"][0];
    assert!(entry["title"].as_str().unwrap().contains("Status Toggled"));
    // Only the field that actually changed appears in the diff
    assert!(entry["description"]
        .as_str()
        .unwrap()
        .contains("is_active 'true' -> 'false'"));
}

#[tokio::test]
async fn test_csv_export() {
    let app = spawn_app().await;

    create_alumni(&app, "csv1@x.com", "active").await;

    let response = app
        .clone()
        .oneshot(get_request("/api/admin/export/alumni", Some(ADMIN_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("id,first_name,last_name,email"));
    assert!(lines.next().unwrap().contains("csv1@x.com"));

    let response = app
        .clone()
        .oneshot(get_request("/api/admin/export/nonsense", Some(ADMIN_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_generation_and_preview() {
    let app = spawn_app().await;

    create_alumni(&app, "r1@x.com", "active").await;
    create_alumni(&app, "r2@x.com", "inactive").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reports/generate",
            Some(ADMIN_TOKEN),
            serde_json::json!({ "report_type": "alumni_summary" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let report_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["data"]["total_alumni"], 2);
    assert_eq!(body["data"]["data"]["active_alumni"], 1);
    assert_eq!(body["data"]["generated_by_name"], "admin");

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/reports/{report_id}/preview"),
            Some(ADMIN_TOKEN),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let lines = body["data"]["lines"].as_array().unwrap();
    assert_eq!(lines[0], "Total alumni: 2");

    // Unknown report kinds fail deserialization instead of being ignored
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reports/generate",
            Some(ADMIN_TOKEN),
            serde_json::json!({ "report_type": "retention_analysis" }),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[cfg(feature = "pdf-reports")]
#[tokio::test]
async fn test_report_pdf_download() {
    let app = spawn_app().await;

    create_alumni(&app, "pdf1@x.com", "active").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/reports/generate",
            Some(ADMIN_TOKEN),
            serde_json::json!({ "report_type": "alumni_summary" }),
        ))
        .await
        .unwrap();
    let report_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/reports/{report_id}/pdf"),
            Some(ADMIN_TOKEN),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_partner_bulk_engagement_level() {
    let app = spawn_app().await;

    for (name, level) in [
        ("Acme", "prospective"),
        ("Globex", "prospective"),
        ("Initech", "gold"),
    ] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/partners",
                Some(ADMIN_TOKEN),
                serde_json::json!({
                    "name": name,
                    "partner_type": "corporate",
                    "email": format!("{}@partners.example.com", name.to_lowercase()),
                    "engagement_level": level,
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/partners/bulk-action",
            Some(ADMIN_TOKEN),
            serde_json::json!({
                "action": "set_engagement_level",
                "from": "prospective",
                "to": "bronze",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["updated"], 2);
}
