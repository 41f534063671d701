//! Proxy subsystem.
//!
//! # Data Flow
//! ```text
//! console "proxy on /foo" ─→ commands.rs (pure) ─→ new ProxySettings
//!                                                      │
//!                                         rules.rs ArcSwap::store
//!                                                      │
//! request path ──→ rules.rs is_enabled (longest ancestor prefix)
//!                     │ true                     │ false
//!                     ▼                          ▼
//!              forward.rs (reqwest)        local route tree
//!                     │
//!          relay response | 502 / 504
//! ```
//!
//! # Design Decisions
//! - Toggles are keyed by normalized prefix; `""` is the root
//! - A proxied request never falls through to local handling, even on failure

pub mod commands;
pub mod forward;
pub mod rules;

pub use commands::{execute, CommandOutcome};
pub use forward::{ForwardError, Forwarder};
pub use rules::{ProxyRules, ProxySettings};
