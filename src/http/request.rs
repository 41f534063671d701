//! Inbound request conversion.
//!
//! # Responsibilities
//! - Buffer the body up to the configured limit
//! - Hand the dispatcher a transport-neutral [`InboundRequest`]
//!
//! # Design Decisions
//! - Bodies are buffered: handlers and the forwarder both need them whole
//! - Oversized bodies are rejected before dispatch with 413

use axum::body::Body;
use axum::http::Request;

use crate::dispatch::request::InboundRequest;
use crate::response::MockResponse;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Buffer `request` into an [`InboundRequest`], or a 413 when the body is too large.
pub async fn into_inbound(
    request: Request<Body>,
    max_body_size: usize,
) -> Result<InboundRequest, MockResponse> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, max_body_size)
        .await
        .map_err(|_| MockResponse::text(413, "Payload Too Large"))?;

    Ok(InboundRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        raw_query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
    })
}

/// The request ID set by the request-id layer, for log fields.
pub fn request_id(request: &Request<Body>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[tokio::test]
    async fn test_into_inbound() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/pets?limit=2")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"Rex"}"#))
            .unwrap();

        let inbound = into_inbound(request, 1024).await.unwrap();
        assert_eq!(inbound.method, Method::POST);
        assert_eq!(inbound.path, "/pets");
        assert_eq!(inbound.raw_query.as_deref(), Some("limit=2"));
        assert_eq!(inbound.header("content-type"), Some("application/json"));
        assert_eq!(&inbound.body[..], br#"{"name":"Rex"}"#);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let request = Request::builder()
            .uri("/upload")
            .body(Body::from(vec![0u8; 64]))
            .unwrap();

        let rejected = into_inbound(request, 16).await.unwrap_err();
        assert_eq!(rejected.status, 413);
    }
}
