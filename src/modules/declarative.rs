//! Handler modules described by TOML or JSON files.
//!
//! A module file has one table per HTTP method:
//!
//! ```toml
//! [get]
//! status = 200
//! random = true
//!
//! [post]
//! status_one_of = [201, 400]
//! json = { ok = true }
//! headers = { location = "/pet/1" }
//! ```
//!
//! `context_key = "pets"` answers with the JSON value stored under `pets` in
//! the route's context.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::Method;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::modules::handler::{HandlerModule, HandlerRequest, HandlerResult};
use crate::routing::path::RouteError;

#[derive(Debug, Error)]
pub enum ModuleLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown HTTP method {method:?} in {path}")]
    UnknownMethod { path: PathBuf, method: String },

    #[error("{0} is not a .toml or .json file")]
    UnsupportedFile(PathBuf),

    #[error("invalid route for {path}: {source}")]
    Route {
        path: PathBuf,
        #[source]
        source: RouteError,
    },
}

/// Status given as a number or a label (`"2XX"`, `"default"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StatusLabel {
    Code(u16),
    Label(String),
}

impl StatusLabel {
    pub fn label(&self) -> String {
        match self {
            StatusLabel::Code(code) => code.to_string(),
            StatusLabel::Label(label) => label.clone(),
        }
    }
}

/// How one method of a route responds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MethodSpec {
    pub status: Option<StatusLabel>,
    pub status_one_of: Vec<StatusLabel>,
    pub random: bool,
    pub json: Option<Value>,
    pub text: Option<String>,
    pub html: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub context_key: Option<String>,
}

impl MethodSpec {
    async fn respond(self: Arc<Self>, request: HandlerRequest) -> HandlerResult {
        let status = match request.tools.one_of(&self.status_one_of) {
            Some(picked) => picked.label(),
            None => self
                .status
                .as_ref()
                .map(StatusLabel::label)
                .unwrap_or_else(|| request.response.default_status()),
        };

        let mut builder = request.response.status(&status)?;
        if self.random {
            builder = builder.random();
        }
        if let Some(key) = &self.context_key {
            let value = request.context.get(key).unwrap_or(Value::Null);
            builder = builder.json(value)?;
        }
        if let Some(value) = &self.json {
            builder = builder.json(value)?;
        }
        if let Some(text) = &self.text {
            builder = builder.text(text.clone())?;
        }
        if let Some(html) = &self.html {
            builder = builder.html(html.clone())?;
        }
        if let (Some(content_type), Some(body)) = (&self.content_type, &self.body) {
            builder = builder.matching(content_type, body.clone())?;
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.clone(), value.clone());
        }

        Ok(builder.finish())
    }
}

/// A parsed module file: method name -> spec.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ModuleFile {
    pub methods: BTreeMap<String, MethodSpec>,
}

impl ModuleFile {
    /// Read and parse a `.toml` or `.json` module file.
    pub fn load(path: &Path) -> Result<Self, ModuleLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| ModuleLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, ModuleLoadError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(content).map_err(|source| ModuleLoadError::Toml {
                path: path.to_path_buf(),
                source,
            }),
            Some("json") => {
                serde_json::from_str(content).map_err(|source| ModuleLoadError::Json {
                    path: path.to_path_buf(),
                    source,
                })
            }
            _ => Err(ModuleLoadError::UnsupportedFile(path.to_path_buf())),
        }
    }

    /// Turn the file into handlers. `path` is only used in errors.
    pub fn into_module(self, path: &Path) -> Result<HandlerModule, ModuleLoadError> {
        let mut module = HandlerModule::new();
        for (name, spec) in self.methods {
            let method = Method::from_bytes(name.to_ascii_uppercase().as_bytes())
                .ok()
                .filter(|m| is_known_method(m))
                .ok_or_else(|| ModuleLoadError::UnknownMethod {
                    path: path.to_path_buf(),
                    method: name.clone(),
                })?;
            let spec = Arc::new(spec);
            module.insert(
                method,
                Arc::new(move |request: HandlerRequest| spec.clone().respond(request)),
            );
        }
        Ok(module)
    }
}

fn is_known_method(method: &Method) -> bool {
    [
        Method::GET,
        Method::PUT,
        Method::POST,
        Method::DELETE,
        Method::OPTIONS,
        Method::HEAD,
        Method::PATCH,
        Method::TRACE,
    ]
    .contains(method)
}
