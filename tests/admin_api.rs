//! Admin API / host bridge over an in-process router.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use backend_router::admin::{setup_admin_router, AdminState};
use backend_router::config::loader::load_config;
use backend_router::host::tcp::StaticDirectory;
use backend_router::lifecycle::Reloader;
use backend_router::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{id, write_config};

const KEY: &str = "test-key";

fn setup(name: &str, config: &str) -> (axum::Router, Arc<Router>, std::path::PathBuf) {
    let path = write_config(name, config);
    let config = load_config(&path).unwrap();

    let directory = Arc::new(StaticDirectory::default());
    let mut health_check = config.health_check.clone();
    health_check.enabled = false;
    let router = Arc::new(Router::new(directory.clone(), health_check));
    let reloader = Arc::new(Reloader::new(&path, router.clone(), directory));
    reloader.start(&config);

    let state = AdminState {
        reloader,
        api_key: KEY.into(),
    };
    (setup_admin_router(state), router, path)
}

async fn call(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", KEY));
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_requires_bearer_token() {
    let (app, _router, path) = setup("auth", r#"servers = ["a"]"#);

    let request = Request::builder().uri("/admin/status").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/admin/status")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    std::fs::remove_file(path).unwrap_or_default();
}

#[tokio::test]
async fn test_session_accounting_and_best() {
    let (app, router, path) = setup("sessions", r#"servers = ["Lobby-1", "Lobby-2"]"#);

    let (status, body) = call(&app, Method::POST, "/admin/sessions/connect", Some(json!({"backend": "LOBBY-1"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"registered": true, "state": {"online": true, "connection_count": 1}}));

    let (_, body) = call(&app, Method::GET, "/admin/best", None).await;
    assert_eq!(body, json!({"backend": "lobby-2"}));

    let (_, body) = call(&app, Method::POST, "/admin/sessions/connect", Some(json!({"backend": "hub"}))).await;
    assert_eq!(body, json!({"registered": false, "state": null}));

    let (_, body) = call(
        &app,
        Method::POST,
        "/admin/sessions/transfer",
        Some(json!({"from": "lobby-1", "to": "lobby-2"})),
    )
    .await;
    assert_eq!(body[0]["state"]["connection_count"], 0);
    assert_eq!(body[1]["state"]["connection_count"], 1);

    let (_, body) = call(&app, Method::POST, "/admin/sessions/disconnect", Some(json!({"backend": "lobby-2"}))).await;
    assert_eq!(body["state"]["connection_count"], 0);
    assert_eq!(router.get(&id("lobby-2")).unwrap().connection_count, 0);

    let (_, body) = call(&app, Method::GET, "/admin/backends", None).await;
    assert_eq!(
        body,
        json!([
            {"name": "lobby-1", "online": true, "connections": 0},
            {"name": "lobby-2", "online": true, "connections": 0},
        ])
    );

    std::fs::remove_file(path).unwrap_or_default();
}

#[tokio::test]
async fn test_events_endpoint() {
    let (app, _router, path) = setup("events", r#"servers = ["a", "b"]"#);

    let (_, body) = call(&app, Method::POST, "/admin/events", Some(json!({"event": "choose_initial_server"}))).await;
    assert_eq!(body, json!({"decision": "route", "backend": "a"}));

    call(&app, Method::POST, "/admin/events", Some(json!({"event": "session_established", "to": "a", "from": null}))).await;

    let (_, body) = call(
        &app,
        Method::POST,
        "/admin/events",
        Some(json!({"event": "connect_failure", "backend": "b", "during_initial_connect": true})),
    )
    .await;
    assert_eq!(body, json!({"decision": "redirect", "backend": "a"}));

    let (_, body) = call(
        &app,
        Method::POST,
        "/admin/events",
        Some(json!({"event": "connect_failure", "backend": "b", "during_initial_connect": false})),
    )
    .await;
    assert_eq!(body, json!({"decision": "no_change"}));

    std::fs::remove_file(path).unwrap_or_default();
}

#[tokio::test]
async fn test_reload_and_rejected_reload() {
    let (app, router, path) = setup("reload", r#"servers = ["a"]"#);
    let generation = router.generation();

    std::fs::write(&path, "servers = [\"b\", \"c\"]\n[addresses]\nb = \"127.0.0.1:25570\"\n").unwrap();
    let (status, body) = call(&app, Method::POST, "/admin/reload", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backends"], 2);
    assert!(body["generation"].as_u64().unwrap() > generation);
    assert!(router.get(&id("a")).is_none());

    // Invalid file: the current backends stay.
    let current = router.generation();
    std::fs::write(&path, "[health_check]\ntimeout_secs = 0\n").unwrap();
    let (status, body) = call(&app, Method::POST, "/admin/reload", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("timeout_secs"));
    assert_eq!(router.generation(), current);
    assert!(router.get(&id("b")).is_some());

    let (_, body) = call(&app, Method::GET, "/admin/status", None).await;
    assert_eq!(body["backends"], 2);
    assert_eq!(body["status"], "operational");

    std::fs::remove_file(path).unwrap_or_default();
}

#[tokio::test]
async fn test_reload_with_same_backends_keeps_counts() {
    let (app, router, path) = setup("same-set", r#"servers = ["a"]"#);
    for _ in 0..5 {
        call(&app, Method::POST, "/admin/sessions/connect", Some(json!({"backend": "a"}))).await;
    }
    let generation = router.generation();

    std::fs::write(&path, "servers = [\"A\"]\n[observability]\nlog_level = \"debug\"\n").unwrap();
    let (status, body) = call(&app, Method::POST, "/admin/reload", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generation"], generation);

    assert_eq!(router.get(&id("a")).unwrap().connection_count, 5);
    let (_, body) = call(&app, Method::POST, "/admin/sessions/disconnect", Some(json!({"backend": "a"}))).await;
    assert_eq!(body["state"]["connection_count"], 4);
    assert_eq!(router.underflow_count(), 0);

    std::fs::remove_file(path).unwrap_or_default();
}
