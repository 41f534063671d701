//! Operator console subsystem.
//!
//! # Data Flow
//! ```text
//! stdin line ──→ repl.rs ──→ commands.rs Console::execute
//!                                 │
//!          ┌──────────────────────┼───────────────────────┐
//!          ▼                      ▼                       ▼
//!  proxy::commands (pure)   ContextRegistry        ModuleRegistry::routes
//!  → ProxyRules::replace    (show / set)
//!                                 │
//!                        CommandOutput { lines, exit }
//! ```
//!
//! # Design Decisions
//! - Command handling is synchronous and I/O free; only repl.rs touches stdio
//! - `exit` stops the whole process through the shared `Shutdown`

pub mod commands;
pub mod repl;

pub use commands::{CommandOutput, Console};
