//! Per-prefix proxy toggles.
//!
//! # Responsibilities
//! - Store `prefix -> enabled` toggles and the upstream URL
//! - Answer "should this path be proxied?" by longest ancestor prefix
//! - Publish changes atomically to in-flight requests
//!
//! # Design Decisions
//! - `ProxySettings` is a plain value; console commands transform it purely
//! - `ProxyRules` holds it behind `ArcSwap`, so readers never block writers

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::path::{ancestors, normalize_prefix};

/// Snapshot of the proxy configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    pub url: Option<String>,
    /// Normalized prefix (`""` is the root) -> enabled.
    pub paths: HashMap<String, bool>,
}

impl ProxySettings {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url: url.map(|u| u.trim_end_matches('/').to_string()),
            paths: HashMap::new(),
        }
    }

    /// Toggle proxying for a prefix, returning the updated settings.
    pub fn with_path(mut self, prefix: &str, enabled: bool) -> Self {
        self.paths.insert(normalize_prefix(prefix), enabled);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Value of the longest registered ancestor-or-equal prefix; `false` if none.
    pub fn is_enabled(&self, path: &str) -> bool {
        ancestors(path)
            .find_map(|prefix| self.paths.get(&prefix).copied())
            .unwrap_or(false)
    }

    /// All toggles, sorted by prefix.
    pub fn status(&self) -> Vec<(String, bool)> {
        let mut entries: Vec<(String, bool)> =
            self.paths.iter().map(|(p, e)| (p.clone(), *e)).collect();
        entries.sort();
        entries
    }
}

/// Live, shared proxy configuration.
#[derive(Debug)]
pub struct ProxyRules {
    settings: ArcSwap<ProxySettings>,
}

impl Default for ProxyRules {
    fn default() -> Self {
        Self::new(ProxySettings::default())
    }
}

impl ProxyRules {
    pub fn new(settings: ProxySettings) -> Self {
        Self {
            settings: ArcSwap::from_pointee(settings),
        }
    }

    pub fn set(&self, prefix: &str, enabled: bool) {
        self.settings
            .rcu(|current| ProxySettings::clone(current).with_path(prefix, enabled));
    }

    pub fn set_url(&self, url: &str) {
        self.settings
            .rcu(|current| ProxySettings::clone(current).with_url(url));
    }

    pub fn is_enabled(&self, path: &str) -> bool {
        self.settings.load().is_enabled(path)
    }

    pub fn status(&self) -> Vec<(String, bool)> {
        self.settings.load().status()
    }

    pub fn url(&self) -> Option<String> {
        self.settings.load().url.clone()
    }

    /// The current settings. Later updates do not affect the returned value.
    pub fn snapshot(&self) -> Arc<ProxySettings> {
        self.settings.load_full()
    }

    /// Publish a whole new settings value.
    pub fn replace(&self, settings: ProxySettings) {
        self.settings.store(Arc::new(settings));
    }
}
