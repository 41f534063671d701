//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Load API description → Build dispatcher
//!     → Load route files → Watcher / metrics / console → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C or console "exit" → trigger → server drains → console stops
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - One broadcast channel shared by every long-running task

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, MockServer, StartupError};
