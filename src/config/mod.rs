//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! apimock.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (main.rs, clap)
//!     → validation.rs (semantic checks)
//!     → MockConfig (validated)
//!     → lifecycle::startup wires every subsystem from it
//!
//! At runtime:
//!     proxy_paths / proxy_url seed the live ProxyRules;
//!     the console mutates those, never the config itself
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Validation runs after CLI overrides so flags are checked too

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{GenerationConfig, MockConfig, ObservabilityConfig, ToggleConfig};
pub use validation::{validate_config, ValidationError};
