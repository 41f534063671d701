//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest (from http or tests)
//!     → strip route_prefix              (outside prefix → 404)
//!     → ProxyRules::is_enabled(path)    (true → Forwarder → relay | 502 | 504)
//!     → RouteTree snapshot lookup       (404 / 405, HEAD → GET)
//!     → ContextRegistry::find(template)
//!     → ResponseFactory + Tools from Accept
//!     → handler.call(...)               (error / panic → 500)
//!     → MockResponse
//! ```
//!
//! # Design Decisions
//! - The dispatcher is transport-neutral; `http` only converts types
//! - Each request holds the route tree snapshot it started with

pub mod dispatcher;
pub mod request;

pub use dispatcher::Dispatcher;
pub use request::InboundRequest;
