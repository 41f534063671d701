//! Outbound forwarding to the proxy URL.
//!
//! # Responsibilities
//! - Rebuild the inbound request against `<proxy url><path>?<query>`
//! - Strip hop-by-hop headers in both directions
//! - Map transport failures to gateway responses
//!
//! # Design Decisions
//! - One pooled `reqwest::Client` with a whole-request timeout
//! - The upstream response is relayed as-is, never re-negotiated

use std::time::Duration;

use axum::http::header::{self, HeaderName};
use axum::http::HeaderMap;
use thiserror::Error;

use crate::dispatch::request::InboundRequest;
use crate::response::MockResponse;

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("no proxy URL is configured")]
    NoUrl,

    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ForwardError {
    /// The gateway response the caller receives.
    pub fn to_response(&self) -> MockResponse {
        match self {
            ForwardError::Timeout(_) => MockResponse::gateway_timeout(),
            _ => MockResponse::bad_gateway("Bad Gateway"),
        }
    }
}

/// Forwards requests to the configured backend.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(ForwardError::Client)?;
        Ok(Self { client, timeout })
    }

    /// Send `request` to `base_url` + `path`, relaying the answer.
    pub async fn forward(
        &self,
        base_url: Option<&str>,
        path: &str,
        request: &InboundRequest,
    ) -> Result<MockResponse, ForwardError> {
        let base_url = base_url.ok_or(ForwardError::NoUrl)?;
        let target = target_url(base_url, path, request.raw_query.as_deref());

        tracing::debug!(method = %request.method, target = %target, "Forwarding request");

        let upstream = self
            .client
            .request(request.method.clone(), &target)
            .headers(outbound_headers(&request.headers))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = upstream.status().as_u16();
        let mut headers = Vec::new();
        let mut content_type = None;
        for (name, value) in upstream.headers() {
            let Ok(value) = value.to_str() else { continue };
            if name == header::CONTENT_TYPE {
                content_type = Some(value.to_string());
            } else if name != header::CONTENT_LENGTH && !is_hop_by_hop(name) {
                headers.push((name.as_str().to_string(), value.to_string()));
            }
        }
        let body = upstream.bytes().await.map_err(|e| self.classify(e))?;

        Ok(MockResponse {
            status,
            content_type,
            headers,
            body,
        })
    }

    fn classify(&self, error: reqwest::Error) -> ForwardError {
        if error.is_timeout() {
            ForwardError::Timeout(self.timeout)
        } else {
            ForwardError::Upstream(error)
        }
    }
}

fn target_url(base_url: &str, path: &str, query: Option<&str>) -> String {
    let mut target = format!("{}{}", base_url.trim_end_matches('/'), path);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn outbound_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if name != header::HOST && name != header::CONTENT_LENGTH && !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}
