//! Handler module subsystem.
//!
//! # Data Flow
//! ```text
//! routes/**/*.toml|json ──→ loader.rs (path → RoutePath, parse) ──→ declarative.rs
//!        ▲                          │                                  (MethodSpec → Handler)
//!        │                          ▼
//! watcher.rs (notify) ──→ registry.swap(route, module)
//!                                   │
//! ApiDescription ──→ registry.declare(api)
//!                                   │
//!                                   ▼
//!                   rebuild RouteTree<RouteHandler> ──→ ArcSwap::store
//!                                   │
//!                        dispatcher loads snapshot per request
//! ```
//!
//! # Design Decisions
//! - Handlers are `Arc<dyn Handler>`; closures and async fns implement the trait
//! - One module per route template; a reload replaces the whole module
//! - A failed reload never unpublishes the last good module

pub mod declarative;
pub mod handler;
pub mod loader;
pub mod registry;
pub mod watcher;

pub use declarative::{MethodSpec, ModuleFile, ModuleLoadError};
pub use handler::{
    default_handler, parse_query, Handler, HandlerError, HandlerModule, HandlerRequest,
    HandlerResult, QueryValue, RequestBody, RouteHandler,
};
pub use loader::{LoadReport, RouteFile, RouteLoader};
pub use registry::ModuleRegistry;
pub use watcher::RouteWatcher;
