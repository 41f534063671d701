//! Configuration schema definitions.
//!
//! Every field has a default so an empty file (or no file) is a valid config.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the mock server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MockConfig {
    /// Directory holding `routes/` with handler and context files.
    pub base_path: PathBuf,

    /// OpenAPI document (JSON or YAML). `None` serves handler files only.
    pub openapi_path: Option<PathBuf>,

    pub port: u16,

    /// Address to bind, without the port.
    pub bind_address: String,

    /// Initial proxy toggles, prefix -> enabled.
    pub proxy_paths: BTreeMap<String, bool>,

    /// Backend requests are forwarded to when their prefix is proxied.
    pub proxy_url: Option<String>,

    /// Prefix stripped from every request path before routing (e.g. `/api/v1`).
    pub route_prefix: String,

    pub start_repl: bool,
    pub start_server: bool,

    pub generate: ToggleConfig,
    pub watch: ToggleConfig,

    pub generation: GenerationConfig,

    /// Whole-request timeout for forwarded requests.
    pub proxy_timeout_secs: u64,

    /// Largest accepted request body in bytes.
    pub max_body_size: usize,

    /// Timeout applied to every inbound request.
    pub request_timeout_secs: u64,

    pub observability: ObservabilityConfig,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            openapi_path: None,
            port: 3100,
            bind_address: "127.0.0.1".to_string(),
            proxy_paths: BTreeMap::new(),
            proxy_url: None,
            route_prefix: String::new(),
            start_repl: false,
            start_server: true,
            generate: ToggleConfig::default(),
            watch: ToggleConfig::default(),
            generation: GenerationConfig::default(),
            proxy_timeout_secs: 30,
            max_body_size: 10 * 1024 * 1024,
            request_timeout_secs: 60,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl MockConfig {
    /// `bind_address:port`.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn routes_dir(&self) -> PathBuf {
        self.base_path.join("routes")
    }
}

/// Routes and types switches used by `generate` and `watch`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToggleConfig {
    pub routes: bool,
    pub types: bool,
}

/// Random response generation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Fixed seed for reproducible random responses.
    pub seed: Option<u64>,

    /// How deep nested schemas are expanded before minimal values are used.
    pub max_depth: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_depth: crate::response::random::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Level for the `apimock` target when `RUST_LOG` is unset.
    pub log_level: String,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: MockConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, 3100);
        assert!(config.start_server);
        assert!(!config.start_repl);
        assert_eq!(config.listen_address(), "127.0.0.1:3100");
        assert_eq!(config.routes_dir(), PathBuf::from("./routes"));
    }

    #[test]
    fn test_full_config() {
        let config: MockConfig = toml::from_str(
            r#"
            base_path = "mock"
            openapi_path = "openapi.yaml"
            port = 8080
            proxy_url = "http://localhost:9000"
            route_prefix = "/api"

            [proxy_paths]
            "/pets" = true

            [watch]
            routes = true

            [generation]
            seed = 42

            [observability]
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.openapi_path, Some(PathBuf::from("openapi.yaml")));
        assert_eq!(config.proxy_paths.get("/pets"), Some(&true));
        assert!(config.watch.routes);
        assert!(!config.watch.types);
        assert_eq!(config.generation.seed, Some(42));
        assert_eq!(config.generation.max_depth, 8);
        assert_eq!(config.observability.log_level, "debug");
    }
}
