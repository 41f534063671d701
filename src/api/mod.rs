//! API description subsystem.
//!
//! # Data Flow
//! ```text
//! openapi.{json,yaml}
//!     → document.rs (parse subset, resolve response $refs)
//!     → ApiDescription (operations indexed by method + template)
//!     → shared via Arc with the dispatcher and the generator
//! ```
//!
//! # Design Decisions
//! - Only what the mock engine needs is modelled; the rest of the document is ignored
//! - Declaration order of statuses and media types is preserved (it drives negotiation)
//! - Schema `$ref`s are resolved lazily so self-referencing schemas can be loaded

pub mod document;
pub mod operation;
pub mod schema;

pub use document::{ApiDescription, ApiLoadError, OperationEntry};
pub use operation::{HeaderSpec, MediaType, Operation, ResponseSpec};
pub use schema::{AdditionalProperties, Components, Schema, SchemaType, SchemaTypes};
