//! Response synthesis subsystem.
//!
//! # Data Flow
//! ```text
//! Accept header ─→ negotiation.rs (AcceptList)
//!                        │
//! Operation ──→ builder.rs (ResponseFactory → ResponseBuilder)
//!                        │   text / json / html / matching / random
//!                        ▼
//!               finish(): first declared media type the client accepts
//!                        │                       │
//!                        ▼                       ▼
//!                  MockResponse          415 fixed triple
//!
//! random.rs (SchemaGenerator) feeds builder.random() and tools.rs
//! ```
//!
//! # Design Decisions
//! - Declaration order of media types wins over the order in the Accept header
//! - Generation is total: malformed or over-deep schemas yield minimal values
//! - One RNG per generator; a configured seed makes every draw reproducible

pub mod builder;
pub mod negotiation;
pub mod random;
pub mod tools;

use axum::body::Bytes;
use axum::http::Method;
use serde::Serialize;

pub use builder::{ResponseBuilder, ResponseError, ResponseFactory};
pub use negotiation::{AcceptList, MediaRange};
pub use random::SchemaGenerator;
pub use tools::Tools;

/// Body of the unsupported-media-type fallback.
pub const UNSUPPORTED_MEDIA_TYPE_BODY: &str = "HTTP 415: Unsupported Media Type";

/// The response shape produced by handlers, the proxy and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl MockResponse {
    /// An empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            content_type: Some("text/plain".to_string()),
            body: Bytes::from(body.into()),
            ..Self::new(status)
        }
    }

    /// Serialize `body` as JSON. Serialization failures degrade to a 500.
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => Self {
                content_type: Some("application/json".to_string()),
                body: Bytes::from(bytes),
                ..Self::new(status)
            },
            Err(e) => Self::internal_error(format!("failed to serialize response: {}", e)),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The fixed `415 / text/plain / "HTTP 415: Unsupported Media Type"` triple.
    pub fn unsupported_media_type() -> Self {
        Self::text(415, UNSUPPORTED_MEDIA_TYPE_BODY)
    }

    pub fn not_found(path: &str) -> Self {
        Self::text(404, format!("Not Found: {}", path))
    }

    pub fn method_not_allowed(allowed: &[Method]) -> Self {
        let allow = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Self::text(405, "Method Not Allowed").with_header("allow", allow)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::text(502, message)
    }

    pub fn gateway_timeout() -> Self {
        Self::text(504, "Gateway Timeout")
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::text(500, message)
    }

    /// First header value with the given (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("content-type") {
            if let Some(ct) = &self.content_type {
                return Some(ct);
            }
        }
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_media_type_triple() {
        let response = MockResponse::unsupported_media_type();
        assert_eq!(response.status, 415);
        assert_eq!(response.content_type.as_deref(), Some("text/plain"));
        assert_eq!(response.body_text(), "HTTP 415: Unsupported Media Type");
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let response = MockResponse::method_not_allowed(&[Method::DELETE, Method::GET]);
        assert_eq!(response.status, 405);
        assert_eq!(response.header("Allow"), Some("DELETE, GET"));
    }

    #[test]
    fn test_json_body() {
        let response = MockResponse::json(201, &serde_json::json!({ "id": 1 }));
        assert_eq!(response.status, 201);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.body_text(), r#"{"id":1}"#);
    }
}
