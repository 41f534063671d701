//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path)
//!     → path.rs (split + normalize)
//!     → router.rs (walk the segment tree)
//!     → Return: Found { handler, params } | MethodNotAllowed | NotFound
//!
//! Tree compilation (startup and every module swap):
//!     registered modules + declared operations
//!     → RouteTree::insert per (method, template)
//!     → published as an immutable snapshot
//! ```
//!
//! # Design Decisions
//! - Literal segments beat parameters; parameters are a fallback with backtracking
//! - Path matching is case-sensitive, trailing slashes are ignored
//! - No regex in the hot path

pub mod path;
pub mod router;

pub use path::{ancestors, normalize_prefix, split_segments, RouteError, RoutePath, Segment};
pub use router::{RouteMatch, RouteTree};
