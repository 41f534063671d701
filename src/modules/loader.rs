//! Maps the routes directory onto handler modules and contexts.
//!
//! # Responsibilities
//! - Translate file paths into route templates
//! - Parse module and context files and publish them
//! - Keep the previous handler when a reload fails
//!
//! # Layout
//! ```text
//! routes/index.toml             → /
//! routes/pets.toml              → /pets
//! routes/pets/index.json        → /pets
//! routes/pets/{petId}.toml      → /pets/{petId}
//! routes/pets/_.context.toml    → context for /pets and below
//! ```

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::context::{Context, ContextRegistry};
use crate::modules::declarative::{ModuleFile, ModuleLoadError};
use crate::modules::registry::ModuleRegistry;
use crate::observability::metrics;
use crate::routing::path::RoutePath;

const CONTEXT_STEM: &str = "_.context";

/// What a file under the routes directory stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteFile {
    Module(RoutePath),
    /// Context for a normalized prefix (`""` is the root).
    Context(String),
}

/// Counts from a full scan.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub modules: usize,
    pub contexts: usize,
    pub errors: Vec<ModuleLoadError>,
}

/// Loads declarative route files into the registries.
#[derive(Debug, Clone)]
pub struct RouteLoader {
    routes_dir: PathBuf,
    registry: Arc<ModuleRegistry>,
    contexts: Arc<ContextRegistry>,
}

impl RouteLoader {
    pub fn new(
        routes_dir: impl Into<PathBuf>,
        registry: Arc<ModuleRegistry>,
        contexts: Arc<ContextRegistry>,
    ) -> Self {
        Self {
            routes_dir: routes_dir.into(),
            registry,
            contexts,
        }
    }

    pub fn routes_dir(&self) -> &Path {
        &self.routes_dir
    }

    /// Load every route file. Failures are reported, not fatal.
    pub fn load_all(&self) -> LoadReport {
        if !self.routes_dir.is_dir() {
            tracing::info!(dir = ?self.routes_dir, "No routes directory, serving declared operations only");
            return LoadReport::default();
        }
        self.load_tree(&self.routes_dir)
    }

    /// Load every route file below `dir`, which must lie in the routes directory.
    pub fn load_tree(&self, dir: &Path) -> LoadReport {
        let mut report = LoadReport::default();
        let mut files = Vec::new();
        collect_files(dir, &mut files, &mut report.errors);
        // Context files first so modules never run against a missing context.
        files.sort_by_key(|f| (self.classify(f).map(|k| matches!(k, RouteFile::Module(_))), f.clone()));

        for file in files {
            match self.reload(&file) {
                Ok(Some(RouteFile::Module(_))) => report.modules += 1,
                Ok(Some(RouteFile::Context(_))) => report.contexts += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load route file");
                    report.errors.push(e);
                }
            }
        }

        tracing::info!(
            modules = report.modules,
            contexts = report.contexts,
            errors = report.errors.len(),
            "Route files loaded"
        );
        report
    }

    /// Re-read one file and publish the result. A file that no longer exists
    /// unregisters its module or context. On error nothing is changed.
    pub fn reload(&self, file: &Path) -> Result<Option<RouteFile>, ModuleLoadError> {
        let Some(kind) = self.classify(file) else {
            return Ok(None);
        };

        let result = if file.exists() {
            self.publish(file, &kind)
        } else {
            self.unpublish(&kind);
            Ok(())
        };

        metrics::record_module_reload(if result.is_ok() { "ok" } else { "error" });
        result.map(|()| Some(kind))
    }

    fn publish(&self, file: &Path, kind: &RouteFile) -> Result<(), ModuleLoadError> {
        match kind {
            RouteFile::Module(route) => {
                let module = ModuleFile::load(file)?.into_module(file)?;
                tracing::info!(route = %route, methods = ?module.methods(), "Module loaded");
                self.registry.swap(route.clone(), module);
            }
            RouteFile::Context(prefix) => {
                let value = load_context_value(file)?;
                self.contexts.register(prefix, Context::from_value(value));
                tracing::info!(prefix = %display_prefix(prefix), "Context loaded");
            }
        }
        Ok(())
    }

    fn unpublish(&self, kind: &RouteFile) {
        match kind {
            RouteFile::Module(route) => {
                if self.registry.remove(route) {
                    tracing::info!(route = %route, "Module removed");
                }
            }
            RouteFile::Context(prefix) if prefix.is_empty() => {
                self.contexts.register("", Context::new());
                tracing::info!("Root context reset");
            }
            RouteFile::Context(prefix) => {
                self.contexts.remove(prefix);
                tracing::info!(prefix = %prefix, "Context removed");
            }
        }
    }

    /// Classify a path under the routes directory. Hidden files and files
    /// other than `.toml`/`.json` are ignored.
    pub fn classify(&self, file: &Path) -> Option<RouteFile> {
        let relative = file.strip_prefix(&self.routes_dir).ok()?;
        let extension = relative.extension()?.to_str()?;
        if extension != "toml" && extension != "json" {
            return None;
        }

        let mut segments = Vec::new();
        for component in relative.parent()?.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_str()?.to_string()),
                _ => return None,
            }
        }

        let stem = relative.file_stem()?.to_str()?;
        let dir = format!("/{}", segments.join("/"));

        if stem == CONTEXT_STEM {
            let route = RoutePath::parse(&dir).ok()?;
            return Some(RouteFile::Context(route.as_prefix()));
        }
        if stem.starts_with('.') || stem.starts_with('_') {
            return None;
        }
        if stem != "index" {
            segments.push(stem.to_string());
        }
        RoutePath::parse(&format!("/{}", segments.join("/")))
            .ok()
            .map(RouteFile::Module)
    }
}

fn display_prefix(prefix: &str) -> &str {
    if prefix.is_empty() {
        "/"
    } else {
        prefix
    }
}

fn load_context_value(file: &Path) -> Result<Value, ModuleLoadError> {
    let content = std::fs::read_to_string(file).map_err(|source| ModuleLoadError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    match file.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|source| ModuleLoadError::Toml {
            path: file.to_path_buf(),
            source,
        }),
        Some("json") => serde_json::from_str(&content).map_err(|source| ModuleLoadError::Json {
            path: file.to_path_buf(),
            source,
        }),
        _ => Err(ModuleLoadError::UnsupportedFile(file.to_path_buf())),
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>, errors: &mut Vec<ModuleLoadError>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) => {
            errors.push(ModuleLoadError::Io {
                path: dir.to_path_buf(),
                source,
            });
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files, errors);
        } else {
            files.push(path);
        }
    }
}
