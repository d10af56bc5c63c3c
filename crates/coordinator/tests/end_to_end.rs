//! End-to-end tests for the coordinator HTTP surface
//!
//! Coordinator and fake workers run on ephemeral localhost ports.

use axum::routing::post;
use axum::{Json, Router};
use hive_common::{EventLog, HiveClient, Registry, RegistryHandle};
use hive_coordinator::{build_router, AppState, DispatchRouter};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Worker stub answering like a real worker after `delay`
async fn spawn_worker(id: &'static str, delay: Duration) -> String {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(move || async move {
            tokio::time::sleep(delay).await;
            Json(json!({"msg": "HIVE_DRONE_SUCCESS", "source": id}))
        }),
    );
    spawn(router).await
}

async fn spawn_coordinator(forward_timeout: Duration) -> (String, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let journal = EventLog::open(dir.path().join("hive_events.log")).await.unwrap();
    let registry = RegistryHandle::spawn(Registry::new());
    let router = DispatchRouter::new(registry, HiveClient::new().unwrap(), forward_timeout);
    let url = spawn(build_router(Arc::new(AppState::new(router, journal)))).await;
    (url, dir)
}

async fn register(client: &reqwest::Client, coordinator: &str, id: &str, url: &str) -> reqwest::Response {
    client
        .post(format!("{}/register", coordinator))
        .json(&json!({"id": id, "url": url}))
        .send()
        .await
        .unwrap()
}

async fn dispatch(client: &reqwest::Client, coordinator: &str) -> (u16, Value) {
    let resp = client
        .post(format!("{}/v1/chat/completions", coordinator))
        .json(&json!({"messages": [{"role": "user", "content": "hello"}]}))
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn three_dispatches_rotate_between_two_workers() {
    let (coordinator, _dir) = spawn_coordinator(Duration::from_secs(5)).await;
    let a = spawn_worker("A", Duration::ZERO).await;
    let b = spawn_worker("B", Duration::ZERO).await;
    let client = reqwest::Client::new();

    register(&client, &coordinator, "A", &a).await;
    register(&client, &coordinator, "B", &b).await;

    let mut sources = Vec::new();
    for _ in 0..3 {
        let (status, body) = dispatch(&client, &coordinator).await;
        assert_eq!(status, 200);
        sources.push(body["source"].as_str().unwrap().to_string());
    }

    assert_eq!(sources, vec!["A", "B", "A"]);
}

#[tokio::test]
async fn dispatch_without_workers_returns_error_payload() {
    let (coordinator, _dir) = spawn_coordinator(Duration::from_secs(5)).await;
    let client = reqwest::Client::new();

    let (status, body) = dispatch(&client, &coordinator).await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({"error": "No workers available"}));
}

#[tokio::test]
async fn dispatch_ignores_content_type_label() {
    let (coordinator, _dir) = spawn_coordinator(Duration::from_secs(5)).await;
    let client = reqwest::Client::new();
    let post_text = |body: &'static str| {
        client
            .post(format!("{}/v1/chat/completions", coordinator))
            .header("content-type", "text/plain")
            .body(body)
            .send()
    };

    // empty registry is reported before the body is read
    let resp = post_text("not json at all").await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": "No workers available"}));

    let a = spawn_worker("A", Duration::ZERO).await;
    register(&client, &coordinator, "A", &a).await;

    let resp = post_text(r#"{"prompt": "hi"}"#).await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["source"], "A");
}

#[tokio::test]
async fn duplicate_registration_is_accepted_once() {
    let (coordinator, dir) = spawn_coordinator(Duration::from_secs(5)).await;
    let client = reqwest::Client::new();

    for url in ["http://10.0.0.2:8081", "http://10.0.0.9:8081"] {
        let resp = register(&client, &coordinator, "A", url).await;
        assert_eq!(resp.status().as_u16(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"status": "ACCEPTED"}));
    }

    let workers: Value = client
        .get(format!("{}/workers", coordinator))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(workers["count"], 1);
    assert_eq!(workers["workers"][0]["url"], "http://10.0.0.2:8081");

    let journal = std::fs::read_to_string(dir.path().join("hive_events.log")).unwrap();
    assert_eq!(journal.lines().count(), 1);
    assert!(journal.contains("worker A joined at http://10.0.0.2:8081"));
}

#[tokio::test]
async fn incomplete_registration_is_rejected() {
    let (coordinator, _dir) = spawn_coordinator(Duration::from_secs(5)).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/register", coordinator))
        .json(&json!({"id": "A"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Malformed request"));
}

#[tokio::test]
async fn slow_worker_times_out_and_rotation_continues() {
    let (coordinator, _dir) = spawn_coordinator(Duration::from_millis(200)).await;
    let slow = spawn_worker("slow", Duration::from_secs(2)).await;
    let fast = spawn_worker("fast", Duration::ZERO).await;
    let client = reqwest::Client::new();

    register(&client, &coordinator, "slow", &slow).await;
    register(&client, &coordinator, "fast", &fast).await;

    let (status, body) = dispatch(&client, &coordinator).await;
    assert_eq!(status, 200);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("slow"), "unexpected error: {}", error);
    assert!(error.contains("timed out"), "unexpected error: {}", error);

    let (_, body) = dispatch(&client, &coordinator).await;
    assert_eq!(body["source"], "fast");
}

#[tokio::test]
async fn health_reports_coordinator_role() {
    let (coordinator, _dir) = spawn_coordinator(Duration::from_secs(5)).await;

    let body: Value = reqwest::get(format!("{}/health", coordinator))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body, json!({"status": "ALIVE", "role": "COORDINATOR"}));
}
