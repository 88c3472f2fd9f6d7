//! Router-level tests: requests go through the real axum app backed by an
//! in-memory SQLite database and a stub prober.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use linkwatch::{
    config::AppConfig,
    db,
    uptime::{Probe, Verdict},
    AppState,
};

struct AlwaysDown;

#[async_trait]
impl Probe for AlwaysDown {
    async fn probe(&self, _url: &str) -> Verdict {
        Verdict::Down
    }
}

fn config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 3001,
        base_url: "https://go.example.com".into(),
        probe_timeout: Duration::from_secs(5),
        monitor_interval: Duration::from_secs(3600),
        monitor_concurrency: 4,
        monitor_enabled: false,
    }
}

async fn setup() -> (Router, Arc<AppState>) {
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::migrate(&pool).await.unwrap();

    let state = Arc::new(AppState::new(pool, config(), Arc::new(AlwaysDown)));
    (linkwatch::router(state.clone()), state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create(app: &Router, url: &str, code: &str) -> Response {
    send(
        app,
        Method::POST,
        "/api/links",
        Some(json!({ "targetUrl": url, "customCode": code })),
    )
    .await
}

#[tokio::test]
async fn create_returns_created_link_envelope() {
    let (app, _) = setup().await;

    let response = create(&app, "https://docs.rs", "docs").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["data"]["shortCode"], "docs");
    assert_eq!(body["data"]["targetUrl"], "https://docs.rs");
    assert_eq!(body["data"]["totalClicks"], 0);
    assert!(body["data"]["lastClicked"].is_null());
    assert_eq!(body["data"]["shortUrl"], "https://go.example.com/api/docs");
}

#[tokio::test]
async fn duplicate_code_is_conflict() {
    let (app, _) = setup().await;

    create(&app, "https://docs.rs", "dup").await;
    let response = create(&app, "https://crates.io", "dup").await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Short code already exists");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn missing_target_url_is_validation_error() {
    let (app, _) = setup().await;

    let response = send(&app, Method::POST, "/api/links", Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Target URL is required");
}

#[tokio::test]
async fn malformed_json_is_validation_error() {
    let (app, _) = setup().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/links")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn redirect_counts_clicks_and_points_at_target() {
    let (app, _) = setup().await;
    create(&app, "https://docs.rs", "go").await;

    for _ in 0..3 {
        let response = send(&app, Method::GET, "/api/go", None).await;
        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://docs.rs"
        );
    }

    let body = json_body(send(&app, Method::GET, "/api/links/go", None).await).await;
    assert_eq!(body["data"]["totalClicks"], 3);
    assert!(!body["data"]["lastClicked"].is_null());
    assert_eq!(body["data"]["clicks"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn unknown_code_is_not_found() {
    let (app, _) = setup().await;

    for uri in ["/api/nothing", "/api/links/nothing"] {
        let response = send(&app, Method::GET, uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "Link not found");
    }
}

#[tokio::test]
async fn stats_include_fresh_sample_and_seven_day_report() {
    let (app, _) = setup().await;
    create(&app, "https://docs.rs", "s").await;

    let response = send(&app, Method::GET, "/api/links/s", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let data = &body["data"];

    let checks = data["uptimeChecks"].as_array().unwrap();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0]["status"], "DOWN");

    let days = data["dailyUptime"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    let today = &days[6];
    assert_eq!(today["totalChecks"], 1);
    assert_eq!(today["downChecks"], 1);
    assert_eq!(today["uptimePercentage"], 0);
    for day in &days[..6] {
        assert_eq!(day["totalChecks"], 0);
        assert_eq!(day["uptimePercentage"], 0);
    }
}

#[tokio::test]
async fn delete_removes_link_and_history() {
    let (app, state) = setup().await;
    create(&app, "https://docs.rs", "tmp").await;
    send(&app, Method::GET, "/api/tmp", None).await;
    send(&app, Method::GET, "/api/links/tmp", None).await;

    let link = db::get_link_by_code(&state.db, "tmp").await.unwrap().unwrap();

    let response = send(&app, Method::DELETE, "/api/links/tmp", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await["data"].is_null());

    assert!(db::get_clicks(&state.db, &link.id).await.unwrap().is_empty());
    assert!(db::get_uptime_checks(&state.db, &link.id)
        .await
        .unwrap()
        .is_empty());

    let again = send(&app, Method::DELETE, "/api/links/tmp", None).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    let redirect = send(&app, Method::GET, "/api/tmp", None).await;
    assert_eq!(redirect.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_paginates_and_searches() {
    let (app, _) = setup().await;
    for (url, code) in [
        ("https://docs.rs", "docs"),
        ("https://crates.io", "crates"),
        ("https://blog.rust-lang.org", "blog"),
    ] {
        create(&app, url, code).await;
    }

    let body = json_body(send(&app, Method::GET, "/api/links?page=1&limit=2", None).await).await;
    let data = &body["data"];
    assert_eq!(data["data"].as_array().unwrap().len(), 2);
    assert_eq!(data["data"][0]["shortCode"], "blog");
    assert_eq!(data["pagination"]["total"], 3);
    assert_eq!(data["pagination"]["totalPages"], 2);
    assert_eq!(data["pagination"]["hasNext"], true);
    assert_eq!(data["pagination"]["hasPrev"], false);

    let body = json_body(send(&app, Method::GET, "/api/links?search=RUST", None).await).await;
    let found = body["data"]["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["shortCode"], "blog");

    let body = json_body(send(&app, Method::GET, "/api/links?page=abc", None).await).await;
    assert_eq!(body["data"]["pagination"]["page"], 1);
    assert_eq!(body["data"]["pagination"]["limit"], 10);
}

#[tokio::test]
async fn health_endpoints_report_database_round_trip() {
    let (app, _) = setup().await;

    let response = send(&app, Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(send(&app, Method::GET, "/healthz", None).await).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["database"]["connected"], true);
    assert!(body["uptime"]["seconds"].is_u64());
    assert!(body["uptime"]["formatted"].is_string());
}
