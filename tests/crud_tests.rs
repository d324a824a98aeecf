use alumnet::config::Config;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

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

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Token {ADMIN_TOKEN}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Token {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seed_alumnus(app: &Router, first: &str, email: &str, year: i32, company: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/alumni",
            serde_json::json!({
                "first_name": first,
                "last_name": "Doe",
                "email": email,
                "degree": "BS",
                "field_of_study": "Computer Engineering",
                "graduation_year": year,
                "current_company": company,
                "industry": "Technology",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn seed_partner(app: &Router, name: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/partners",
            serde_json::json!({
                "name": name,
                "partner_type": "corporate",
                "email": format!("{}@partners.example.com", name.to_lowercase()),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_alumni_list_filters_and_pagination() {
    let app = spawn_app().await;

    seed_alumnus(&app, "Ana", "ana@x.com", 2018, "Initech").await;
    seed_alumnus(&app, "Ben", "ben@x.com", 2019, "Globex").await;
    seed_alumnus(&app, "Cal", "cal@x.com", 2018, "Initech").await;

    let response = app
        .clone()
        .oneshot(get_request("/api/alumni?graduation_year=2018"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 2);

    let response = app
        .clone()
        .oneshot(get_request("/api/alumni?search=Globex"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["first_name"], "Ben");

    let response = app
        .clone()
        .oneshot(get_request("/api/alumni?page=2&page_size=2"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(get_request("/api/alumni?page_size=500"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_alumni_detail_includes_engagements() {
    let app = spawn_app().await;

    let alumni_id = seed_alumnus(&app, "Dia", "dia@x.com", 2020, "Initech").await;
    let partner_id = seed_partner(&app, "Acme").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/alumni/{alumni_id}/engagements"),
            serde_json::json!({
                "partner_id": partner_id,
                "engagement_type": "mentorship",
                "engagement_date": "2026-05-01T10:00:00Z",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/alumni/{alumni_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let engagements = body["data"]["engagements"].as_array().unwrap();
    assert_eq!(engagements.len(), 1);
    assert_eq!(engagements[0]["partner_name"], "Acme");
    assert_eq!(engagements[0]["alumni_name"], "Dia Doe");

    // Unknown partner is a 404, not a constraint error
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/alumni/{alumni_id}/engagements"),
            serde_json::json!({
                "partner_id": 9999,
                "engagement_type": "mentorship",
                "engagement_date": "2026-05-01T10:00:00Z",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_alumni_statistics_group_counts() {
    let app = spawn_app().await;

    seed_alumnus(&app, "Eve", "eve@x.com", 2018, "Initech").await;
    seed_alumnus(&app, "Fay", "fay@x.com", 2018, "Globex").await;
    seed_alumnus(&app, "Gus", "gus@x.com", 2021, "Initech").await;

    let response = app
        .clone()
        .oneshot(get_request("/api/alumni/statistics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total_alumni"], 3);
    assert_eq!(body["data"]["by_degree"]["BS"], 3);
    assert_eq!(body["data"]["by_graduation_year"]["2018"], 2);
    assert_eq!(body["data"]["by_industry"]["Technology"], 3);
}

#[tokio::test]
async fn test_partner_top_engaged_ordering() {
    let app = spawn_app().await;

    let alumni_id = seed_alumnus(&app, "Hal", "hal@x.com", 2017, "Initech").await;
    let quiet = seed_partner(&app, "Quiet").await;
    let busy = seed_partner(&app, "Busy").await;

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/partners/{busy}/engagements"),
                serde_json::json!({
                    "alumni_id": alumni_id,
                    "engagement_type": "networking_event",
                    "engagement_date": "2026-06-01T09:00:00Z",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/partners/top-engaged?limit=2"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Busy");
    assert_eq!(items[0]["engagement_count"], 3);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/partners/{quiet}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["engagement_count"], 0);
}

#[tokio::test]
async fn test_engagements_recent_and_by_type() {
    let app = spawn_app().await;

    let alumni_id = seed_alumnus(&app, "Ivy", "ivy@x.com", 2016, "Initech").await;
    let partner_id = seed_partner(&app, "Acme").await;

    for (engagement_type, date) in [
        ("mentorship", "2026-01-01T00:00:00Z"),
        ("interview", "2026-02-01T00:00:00Z"),
        ("mentorship", "2026-03-01T00:00:00Z"),
    ] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/engagements",
                serde_json::json!({
                    "alumni_id": alumni_id,
                    "partner_id": partner_id,
                    "engagement_type": engagement_type,
                    "engagement_date": date,
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(get_request("/api/engagements/recent?limit=2"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["engagement_date"], "2026-03-01T00:00:00Z");

    let response = app
        .clone()
        .oneshot(get_request("/api/engagements/by-type?type=mentorship"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Unknown type is rejected up front
    let response = app
        .clone()
        .oneshot(get_request("/api/engagements/by-type?type=golf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partner_duplicate_name_rejected() {
    let app = spawn_app().await;

    seed_partner(&app, "Acme").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/partners",
            serde_json::json!({
                "name": "acme",
                "partner_type": "corporate",
                "email": "other@partners.example.com",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["errors"]["name"].is_string());
}
