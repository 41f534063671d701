//! Context subsystem.
//!
//! # Data Flow
//! ```text
//! _.context.toml (routes/<dir>/)  ──→ modules::loader ──→ register("/<dir>", Context)
//!                                                              │
//! request template /pets/{id} ──→ registry.find ──→ longest ancestor, else root
//!                                                              │
//!                                       handler / console read and mutate it
//! ```
//!
//! # Design Decisions
//! - The registry is generic over the context type; the server uses [`Context`]
//! - Contexts are handles: clones share one object
//! - Reloading a context file replaces the handle, it does not merge

pub mod registry;
pub mod store;

pub use registry::ContextRegistry;
pub use store::Context;
