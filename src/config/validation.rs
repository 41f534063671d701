//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the proxy URL, prefixes and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MockConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::MockConfig;
use crate::proxy::commands::validate_url;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("proxy_url {url:?} is invalid: {reason}")]
    ProxyUrl { url: String, reason: String },

    #[error("proxy_paths key {0:?} must start with '/'")]
    ProxyPrefix(String),

    #[error("route_prefix {0:?} must start with '/'")]
    RoutePrefix(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),

    #[error("log_level {0:?} is not one of trace, debug, info, warn, error")]
    LogLevel(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &MockConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(url) = &config.proxy_url {
        if let Err(reason) = validate_url(url) {
            errors.push(ValidationError::ProxyUrl {
                url: url.clone(),
                reason,
            });
        }
    }

    for prefix in config.proxy_paths.keys() {
        if !prefix.is_empty() && !prefix.starts_with('/') {
            errors.push(ValidationError::ProxyPrefix(prefix.clone()));
        }
    }

    if !config.route_prefix.is_empty() && !config.route_prefix.starts_with('/') {
        errors.push(ValidationError::RoutePrefix(config.route_prefix.clone()));
    }

    for (field, value) in [
        ("proxy_timeout_secs", config.proxy_timeout_secs),
        ("request_timeout_secs", config.request_timeout_secs),
        ("max_body_size", config.max_body_size as u64),
        ("generation.max_depth", config.generation.max_depth as u64),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::LogLevel(observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&MockConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = MockConfig::default();
        config.proxy_url = Some("ftp://example.com".into());
        config.route_prefix = "api".into();
        config.proxy_paths.insert("pets".into(), true);
        config.proxy_timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], ValidationError::ProxyUrl { .. }));
        assert!(errors.contains(&ValidationError::RoutePrefix("api".into())));
        assert!(errors.contains(&ValidationError::Zero {
            field: "proxy_timeout_secs"
        }));
    }
}
