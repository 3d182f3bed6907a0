mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use clap::Parser;
use common::{bodies, is_notification};
use multiorder::application::engine::DispatchEngine;
use multiorder::config::ServerConfig;
use multiorder::domain::remote::RemoteResponse;
use multiorder::infrastructure::in_memory::InMemoryRemote;
use multiorder::interfaces::http::{AppState, router};
use serde_json::{Value, json};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    engine: DispatchEngine,
    remote: InMemoryRemote,
}

fn test_app(static_dir: &Path) -> TestApp {
    let remote = InMemoryRemote::always(RemoteResponse::open());
    let engine = DispatchEngine::new(Arc::new(remote.clone()));
    let config = ServerConfig::try_parse_from([
        OsStr::new("multiorder"),
        OsStr::new("--static-dir"),
        static_dir.as_os_str(),
    ])
    .unwrap();
    let app = router(AppState::new(engine.clone()), &config);
    TestApp { app, engine, remote }
}

fn static_site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>app</html>").unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/app.js"), "console.log(1)").unwrap();
    dir
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

fn post_multiorder(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/multiorder")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let site = static_site();
    let TestApp { app, .. } = test_app(site.path());

    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn test_multiorder_is_accepted_and_dispatched() {
    let site = static_site();
    let TestApp {
        app,
        engine,
        remote,
    } = test_app(site.path());
    let request = json!({
        "address": "http://svc/x",
        "threads": [[{"account": {"id": 1}, "order": {"id": 1}}]],
        "response": {"done": true}
    });

    let response = app.oneshot(post_multiorder(request.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({"accepted": true, "threads": 1}));

    engine.drain().await;
    let bodies = bodies(&remote.calls().await);
    assert_eq!(
        bodies,
        vec![json!({"id": 1}), json!({"id": 1}), json!({"done": true})]
    );
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let site = static_site();
    let TestApp {
        app,
        engine,
        remote,
    } = test_app(site.path());

    let response = app.oneshot(post_multiorder("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["status"], json!(400));

    engine.drain().await;
    assert!(remote.calls().await.is_empty());
}

#[tokio::test]
async fn test_wrong_shape_and_bad_address_are_bad_requests() {
    let site = static_site();
    let TestApp { app, remote, .. } = test_app(site.path());

    for body in [
        json!({"threads": []}),
        json!({"address": "http://svc/x", "threads": "none"}),
        json!({"address": "", "threads": []}),
        json!({"address": "svc-without-scheme", "threads": []}),
    ] {
        let response = app
            .clone()
            .oneshot(post_multiorder(body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }

    assert!(remote.calls().await.is_empty());
}

#[tokio::test]
async fn test_zero_threads_request_notifies() {
    let site = static_site();
    let TestApp {
        app,
        engine,
        remote,
    } = test_app(site.path());

    let response = app
        .oneshot(post_multiorder(
            json!({"address": "http://svc/x", "threads": [], "response": {"done": true}}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    engine.drain().await;
    let bodies = bodies(&remote.calls().await);
    assert_eq!(bodies.len(), 1);
    assert!(is_notification(&bodies[0]));
}

#[tokio::test]
async fn test_missing_threads_dispatches_zero_threads() {
    let site = static_site();
    let TestApp {
        app,
        engine,
        remote,
    } = test_app(site.path());

    let response = app
        .oneshot(post_multiorder(
            json!({"address": "http://svc/x", "response": {"done": true}}).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({"accepted": true, "threads": 0}));

    engine.drain().await;
    let calls = remote.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].address, "http://svc/x");
    assert!(is_notification(&calls[0].json().unwrap()));
}

#[tokio::test]
async fn test_multiorder_only_accepts_post() {
    let site = static_site();
    let TestApp { app, .. } = test_app(site.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/multiorder")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_existing_static_file_is_served() {
    let site = static_site();
    let TestApp { app, .. } = test_app(site.path());

    let response = app
        .oneshot(Request::builder().uri("/assets/app.js").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"console.log(1)".to_vec());
}

#[tokio::test]
async fn test_unknown_path_falls_back_to_index() {
    let site = static_site();
    let TestApp { app, .. } = test_app(site.path());

    for uri in ["/", "/orders/42", "/assets/missing.css"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "uri: {uri}");
        assert_eq!(body_bytes(response).await, b"<html>app</html>".to_vec());
    }
}

#[tokio::test]
async fn test_traversal_does_not_escape_static_dir() {
    let outer = tempfile::tempdir().unwrap();
    std::fs::write(outer.path().join("secret.txt"), "secret").unwrap();
    let site = outer.path().join("build");
    std::fs::create_dir(&site).unwrap();
    std::fs::write(site.join("index.html"), "<html>app</html>").unwrap();
    let TestApp { app, .. } = test_app(&site);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/../secret.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = body_bytes(response).await;
    assert_ne!(body, b"secret".to_vec());
}
