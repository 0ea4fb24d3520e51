use super::*;
use crate::manager::test_helpers::{create_test_manager, run_to_fetch_end};
use crate::store::MemoryStore;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;


/// Started service over an in-memory store, with default config
fn create_test_service() -> (TaskService, Arc<Config>) {
    let service = TaskService::new(create_test_manager(), Arc::new(MemoryStore::new()));
    (service, Arc::new(Config::default()))
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_api_server_serves_and_stops() {
    let (service, config) = create_test_service();
    let mut config = (*config).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(start_api_server(service, Arc::new(config), async {
        let _ = stop_rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop on shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (service, config) = create_test_service();
    let app = create_router(service, config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (service, config) = create_test_service();
    let mut config = (*config).clone();
    config.api.cors_enabled = false;
    let app = create_router(service, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_api_key_guards_routes() {
    let (service, config) = create_test_service();
    let mut config = (*config).clone();
    config.api.api_key = Some("s3cret".to_string());
    let app = create_router(service, Arc::new(config));

    let denied = app
        .clone()
        .oneshot(empty_request(Method::GET, "/tasks/stats"))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/tasks/stats")
        .header("X-Api-Key", "s3cret")
        .body(Body::empty())
        .unwrap();
    let allowed = app.oneshot(request).await.unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let (service, config) = create_test_service();
    let mut disabled = (*config).clone();
    disabled.api.swagger_ui = false;

    let enabled_app = create_router(service.clone(), config);
    let disabled_app = create_router(service, Arc::new(disabled));

    let enabled = enabled_app
        .oneshot(empty_request(Method::GET, "/swagger-ui"))
        .await
        .unwrap();
    let disabled = disabled_app
        .oneshot(empty_request(Method::GET, "/swagger-ui"))
        .await
        .unwrap();

    assert_ne!(enabled.status(), StatusCode::NOT_FOUND);
    assert_eq!(disabled.status(), StatusCode::NOT_FOUND);
}
