//! In-process tests of the full HTTP stack against the petstore description.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use apimock::config::MockConfig;
use apimock::{HttpServer, MockServer};

mod common;

fn petstore_config(dir: &std::path::Path) -> MockConfig {
    common::write_file(dir, "openapi.yaml", common::PETSTORE);
    MockConfig {
        base_path: dir.to_path_buf(),
        openapi_path: Some(dir.join("openapi.yaml")),
        generation: apimock::config::GenerationConfig {
            seed: Some(7),
            ..Default::default()
        },
        ..MockConfig::default()
    }
}

fn router(config: &MockConfig) -> axum::Router {
    let (server, report) = MockServer::build(config).unwrap();
    assert!(report.errors.is_empty(), "route files failed: {:?}", report.errors);
    HttpServer::new(server.dispatcher().clone(), config).router()
}

async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_declared_operation_returns_schema_conformant_json() {
    let dir = tempfile::tempdir().unwrap();
    let router = router(&petstore_config(dir.path()));

    let (status, headers, body) = send(&router, get("/pet/findByStatus?status=available")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/json");
    assert!(headers.contains_key("x-request-id"));

    let pets: Value = serde_json::from_slice(&body).unwrap();
    for pet in pets.as_array().unwrap() {
        assert!(pet["id"].is_i64());
        assert_eq!(pet["name"], "doggie");
    }
}

#[tokio::test]
async fn test_content_negotiation_and_415() {
    let dir = tempfile::tempdir().unwrap();
    let router = router(&petstore_config(dir.path()));

    let request = Request::builder()
        .uri("/pet/12")
        .header("accept", "application/json")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/json");

    let request = Request::builder()
        .uri("/pet/12")
        .header("accept", "text/plain")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(headers["content-type"], "text/plain");
    assert_eq!(body, b"HTTP 415: Unsupported Media Type");
}

#[tokio::test]
async fn test_not_found_and_method_not_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let router = router(&petstore_config(dir.path()));

    let (status, _, _) = send(&router, get("/store/inventory")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method("PUT")
        .uri("/pet/1")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers["allow"], "DELETE, GET");

    let request = Request::builder()
        .method("DELETE")
        .uri("/pet/1")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_route_files_and_context() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = petstore_config(dir.path());
    config.route_prefix = "/api".into();

    common::write_file(dir.path(), "routes/pet/_.context.toml", "owner = \"Ann\"\n");
    common::write_file(
        dir.path(),
        "routes/pet/{petId}.toml",
        r#"
        [get]
        status = 200
        context_key = "owner"

        [delete]
        status = 204
        headers = { x-deleted = "yes" }
        "#,
    );
    common::write_file(
        dir.path(),
        "routes/health.json",
        r#"{ "get": { "status": 200, "text": "ok", "headers": { "x-mock": "yes" } } }"#,
    );
    let router = router(&config);

    let (status, _, body) = send(&router, get("/api/pet/3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, br#""Ann""#);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/pet/3")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(headers["x-deleted"], "yes");

    let (status, headers, body) = send(&router, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-mock"], "yes");
    assert_eq!(body, b"ok");

    let (status, _, _) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_body_limit() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = petstore_config(dir.path());
    config.max_body_size = 16;
    let router = router(&config);

    let request = Request::builder()
        .method("DELETE")
        .uri("/pet/1")
        .body(Body::from(vec![b'x'; 64]))
        .unwrap();
    let (status, _, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
