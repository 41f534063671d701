//! Handler contract: what a handler receives and what it returns.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::api::operation::Operation;
use crate::context::Context;
use crate::response::negotiation::is_json;
use crate::response::{MockResponse, ResponseError, ResponseFactory, Tools};
use crate::routing::path::RoutePath;

/// A query parameter: one value, or several when the key repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Many(Vec<String>),
}

impl QueryValue {
    /// The first value.
    pub fn first(&self) -> &str {
        match self {
            QueryValue::Single(v) => v,
            QueryValue::Many(vs) => vs.first().map(String::as_str).unwrap_or(""),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(existing) => {
                *self = QueryValue::Many(vec![std::mem::take(existing), value]);
            }
            QueryValue::Many(values) => values.push(value),
        }
    }
}

/// Decode a raw query string. Repeated keys collect into [`QueryValue::Many`].
pub fn parse_query(raw: Option<&str>) -> HashMap<String, QueryValue> {
    let mut query: HashMap<String, QueryValue> = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.unwrap_or("").as_bytes()) {
        match query.get_mut(key.as_ref()) {
            Some(existing) => existing.push(value.into_owned()),
            None => {
                query.insert(key.into_owned(), QueryValue::Single(value.into_owned()));
            }
        }
    }
    query
}

/// The request body, decoded by content type.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Text(String),
    Binary(Bytes),
}

impl RequestBody {
    /// JSON bodies are parsed when the content type says so; malformed JSON
    /// is kept as text.
    pub fn decode(content_type: Option<&str>, body: &Bytes) -> Self {
        if body.is_empty() {
            return RequestBody::Empty;
        }
        if content_type.map(is_json).unwrap_or(false) {
            if let Ok(value) = serde_json::from_slice(body) {
                return RequestBody::Json(value);
            }
        }
        match std::str::from_utf8(body) {
            Ok(text) => RequestBody::Text(text.to_string()),
            Err(_) => RequestBody::Binary(body.clone()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Everything a handler is given for one request.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub method: Method,
    /// The matched template, e.g. `/pet/{petId}`.
    pub template: RoutePath,
    /// Path parameters by name, raw.
    pub path: HashMap<String, String>,
    pub query: HashMap<String, QueryValue>,
    pub headers: HeaderMap,
    pub body: RequestBody,
    pub context: Context,
    pub tools: Tools,
    pub response: ResponseFactory,
}

impl HandlerRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error("{0}")]
    Message(String),
}

pub type HandlerResult = Result<MockResponse, HandlerError>;

/// An async request handler.
///
/// Implemented for any `Fn(HandlerRequest) -> impl Future<Output = HandlerResult>`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: HandlerRequest) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: HandlerRequest) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(request))
    }
}

/// Handlers for one route, by method.
#[derive(Clone, Default)]
pub struct HandlerModule {
    handlers: HashMap<Method, Arc<dyn Handler>>,
}

impl std::fmt::Debug for HandlerModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerModule")
            .field("methods", &self.methods())
            .finish()
    }
}

impl HandlerModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, method: Method, handler: impl Handler) -> Self {
        self.handlers.insert(method, Arc::new(handler));
        self
    }

    pub fn insert(&mut self, method: Method, handler: Arc<dyn Handler>) {
        self.handlers.insert(method, handler);
    }

    pub fn get(&self, method: &Method) -> Option<Arc<dyn Handler>> {
        self.handlers.get(method).cloned()
    }

    /// Registered methods, sorted.
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.handlers.keys().cloned().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// What the route tree stores: the handler plus the operation it serves.
#[derive(Clone)]
pub struct RouteHandler {
    pub handler: Arc<dyn Handler>,
    pub operation: Option<Arc<Operation>>,
}

impl std::fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteHandler")
            .field("operation", &self.operation.as_ref().map(|op| op.method.clone()))
            .finish()
    }
}

/// Serves a declared operation that has no handler module: a random
/// response for its default status.
pub async fn default_handler(request: HandlerRequest) -> HandlerResult {
    let status = request.response.default_status();
    Ok(request.response.status(&status)?.random().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_query_collects_repeats() {
        let query = parse_query(Some("status=available&status=sold&limit=10&q=a%20b"));
        assert_eq!(
            query.get("status"),
            Some(&QueryValue::Many(vec!["available".into(), "sold".into()]))
        );
        assert_eq!(query.get("limit").map(QueryValue::first), Some("10"));
        assert_eq!(query.get("q").map(QueryValue::first), Some("a b"));
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn test_request_body_decoding() {
        let json_body = Bytes::from_static(br#"{"name":"Rex"}"#);
        assert_eq!(
            RequestBody::decode(Some("application/json"), &json_body),
            RequestBody::Json(json!({ "name": "Rex" }))
        );
        assert_eq!(
            RequestBody::decode(Some("text/plain"), &json_body),
            RequestBody::Text(r#"{"name":"Rex"}"#.into())
        );
        assert_eq!(
            RequestBody::decode(Some("application/json"), &Bytes::new()),
            RequestBody::Empty
        );
        assert!(matches!(
            RequestBody::decode(None, &Bytes::from_static(&[0xff, 0xfe])),
            RequestBody::Binary(_)
        ));
    }

    #[test]
    fn test_module_methods_sorted() {
        let module = HandlerModule::new()
            .with(Method::POST, default_handler)
            .with(Method::GET, default_handler);
        assert_eq!(module.methods(), vec![Method::GET, Method::POST]);
    }
}
