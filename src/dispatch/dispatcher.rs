//! Per-request composition of proxy, routing, context and handler.
//!
//! # Responsibilities
//! - Strip the configured route prefix
//! - Decide proxy vs. local handling
//! - Match the route, resolve its context, build the response factory
//! - Invoke the handler, turning errors and panics into 500s

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header, Method};
use futures_util::FutureExt;

use crate::api::document::ApiDescription;
use crate::config::MockConfig;
use crate::context::ContextRegistry;
use crate::dispatch::request::InboundRequest;
use crate::modules::handler::{parse_query, HandlerRequest, RequestBody, RouteHandler};
use crate::modules::registry::ModuleRegistry;
use crate::observability::metrics;
use crate::proxy::forward::{ForwardError, Forwarder};
use crate::proxy::rules::{ProxyRules, ProxySettings};
use crate::response::negotiation::AcceptList;
use crate::response::random::SchemaGenerator;
use crate::response::{MockResponse, ResponseFactory, Tools};
use crate::routing::path::{normalize_prefix, RoutePath};
use crate::routing::router::RouteMatch;

/// Turns inbound requests into responses.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<ModuleRegistry>,
    contexts: Arc<ContextRegistry>,
    proxy: Arc<ProxyRules>,
    forwarder: Forwarder,
    generator: Arc<SchemaGenerator>,
    route_prefix: String,
}

impl Dispatcher {
    /// Wire a dispatcher from config: proxy toggles, generator seed, prefix.
    pub fn new(api: Arc<ApiDescription>, config: &MockConfig) -> Result<Self, ForwardError> {
        let generator = match config.generation.seed {
            Some(seed) => SchemaGenerator::seeded(api.components(), config.generation.max_depth, seed),
            None => SchemaGenerator::new(api.components(), config.generation.max_depth),
        };

        let settings = config
            .proxy_paths
            .iter()
            .fold(ProxySettings::new(config.proxy_url.clone()), |s, (prefix, enabled)| {
                s.with_path(prefix, *enabled)
            });

        Ok(Self {
            registry: Arc::new(ModuleRegistry::new(api)),
            contexts: Arc::new(ContextRegistry::default()),
            proxy: Arc::new(ProxyRules::new(settings)),
            forwarder: Forwarder::new(Duration::from_secs(config.proxy_timeout_secs))?,
            generator: Arc::new(generator),
            route_prefix: normalize_prefix(&config.route_prefix),
        })
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    pub fn contexts(&self) -> &Arc<ContextRegistry> {
        &self.contexts
    }

    pub fn proxy(&self) -> &Arc<ProxyRules> {
        &self.proxy
    }

    pub fn generator(&self) -> &Arc<SchemaGenerator> {
        &self.generator
    }

    pub async fn dispatch(&self, request: InboundRequest) -> MockResponse {
        let start = Instant::now();
        let method = request.method.clone();

        let (response, outcome) = self.resolve(request).await;

        tracing::debug!(
            method = %method,
            status = response.status,
            outcome,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request dispatched"
        );
        metrics::record_request(method.as_str(), response.status, outcome, start);
        response
    }

    async fn resolve(&self, request: InboundRequest) -> (MockResponse, &'static str) {
        let Some(path) = self.strip_prefix(&request.path) else {
            return (MockResponse::not_found(&request.path), "not_found");
        };

        if self.proxy.is_enabled(&path) {
            return self.forward(&path, &request).await;
        }

        let tree = self.registry.snapshot();
        let mut found = tree.lookup(&request.method, &path);
        let head_fallback = request.method == Method::HEAD && !matches!(found, RouteMatch::Found { .. });
        if head_fallback {
            if let get @ RouteMatch::Found { .. } = tree.lookup(&Method::GET, &path) {
                found = get;
            }
        }

        match found {
            RouteMatch::Found {
                handler,
                params,
                template,
            } => {
                let mut response = self.invoke(handler, params, template, request).await;
                let outcome = if response.status >= 500 { "handler_error" } else { "local" };
                if head_fallback {
                    response.body = Default::default();
                }
                (response, outcome)
            }
            RouteMatch::MethodNotAllowed { allowed } => {
                (MockResponse::method_not_allowed(&allowed), "method_not_allowed")
            }
            RouteMatch::NotFound => (MockResponse::not_found(&path), "not_found"),
        }
    }

    /// The path below the route prefix, or `None` if it lies outside it.
    fn strip_prefix(&self, path: &str) -> Option<String> {
        if self.route_prefix.is_empty() {
            return Some(path.to_string());
        }
        let rest = path.strip_prefix(&self.route_prefix)?;
        if rest.is_empty() {
            Some("/".to_string())
        } else if rest.starts_with('/') {
            Some(rest.to_string())
        } else {
            None
        }
    }

    async fn forward(&self, path: &str, request: &InboundRequest) -> (MockResponse, &'static str) {
        let url = self.proxy.url();
        match self.forwarder.forward(url.as_deref(), path, request).await {
            Ok(response) => (response, "proxied"),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Proxy request failed");
                let kind = match &e {
                    ForwardError::Timeout(_) => "timeout",
                    ForwardError::NoUrl => "no_url",
                    _ => "upstream",
                };
                metrics::record_proxy_error(kind);
                (e.to_response(), "proxy_error")
            }
        }
    }

    async fn invoke(
        &self,
        route: RouteHandler,
        params: std::collections::HashMap<String, String>,
        template: RoutePath,
        request: InboundRequest,
    ) -> MockResponse {
        let accept = Arc::new(AcceptList::parse(request.header(header::ACCEPT.as_str())));
        let content_type = request.header(header::CONTENT_TYPE.as_str()).map(str::to_string);

        let handler_request = HandlerRequest {
            method: request.method.clone(),
            context: self.contexts.find(&template.to_string()),
            path: params,
            query: parse_query(request.raw_query.as_deref()),
            body: RequestBody::decode(content_type.as_deref(), &request.body),
            headers: request.headers,
            tools: Tools::new(accept.clone(), self.generator.clone()),
            response: ResponseFactory::new(route.operation, accept, self.generator.clone()),
            template: template.clone(),
        };

        let handler = route.handler;
        let outcome = AssertUnwindSafe(async move { handler.call(handler_request).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(route = %template, error = %e, "Handler failed");
                MockResponse::internal_error(e.to_string())
            }
            Err(_) => {
                tracing::error!(route = %template, "Handler panicked");
                MockResponse::internal_error("Internal Server Error")
            }
        }
    }
}
