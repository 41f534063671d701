//! OpenAPI mock server library.

// Core engine
pub mod api;
pub mod context;
pub mod proxy;
pub mod response;
pub mod routing;

// Handler lifecycle and request flow
pub mod dispatch;
pub mod modules;

// Surfaces
pub mod console;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::MockConfig;
pub use dispatch::{Dispatcher, InboundRequest};
pub use http::HttpServer;
pub use lifecycle::{MockServer, Shutdown};
pub use response::MockResponse;
