//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum, tower-http layers: request ID, trace, timeout, body limit)
//!     → request.rs (buffer body → InboundRequest)
//!     → dispatch::Dispatcher
//!     → response.rs (MockResponse → axum Response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
