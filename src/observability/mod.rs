//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher / loader / forwarder
//!     → logging.rs (tracing events with structured fields)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer, EnvFilter)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request spans and `x-request-id` come from tower-http layers in `http`
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
