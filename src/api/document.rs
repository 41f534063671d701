//! Loading the subset of an OpenAPI document the mock server consumes.
//!
//! Only `paths.*.<method>.responses` and `components.{schemas,responses}` are
//! read. Response `$ref`s are resolved here; schema `$ref`s are left in place
//! and followed lazily by the generator.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::http::Method;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::api::operation::{ordered_map, Operation, ResponseSpec};
use crate::api::schema::{Components, Schema};
use crate::routing::{RouteError, RoutePath};

/// Errors raised while loading an API description.
#[derive(Debug, Error)]
pub enum ApiLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid path template: {0}")]
    Route(#[from] RouteError),

    #[error("unresolved response reference {0}")]
    UnresolvedResponse(String),
}

const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

const RESPONSE_PREFIX: &str = "#/components/responses/";

/// One operation bound to its path template.
#[derive(Debug, Clone)]
pub struct OperationEntry {
    pub path: RoutePath,
    pub operation: Arc<Operation>,
}

/// In-memory API description: declared operations plus shared schemas.
#[derive(Debug, Clone, Default)]
pub struct ApiDescription {
    entries: Vec<OperationEntry>,
    index: HashMap<(Method, String), Arc<Operation>>,
    components: Arc<Components>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawDocument {
    #[serde(deserialize_with = "ordered_map")]
    paths: Vec<(String, Value)>,
    components: RawComponents,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawComponents {
    schemas: HashMap<String, Schema>,
    responses: HashMap<String, Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawOperation {
    #[serde(deserialize_with = "ordered_map")]
    responses: Vec<(String, Value)>,
}

impl ApiDescription {
    /// An empty description: every route is served by explicit handlers only.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a description from operations assembled in code.
    pub fn from_operations(
        operations: impl IntoIterator<Item = (RoutePath, Operation)>,
        components: Components,
    ) -> Self {
        let mut api = Self {
            components: Arc::new(components),
            ..Self::default()
        };
        for (path, operation) in operations {
            api.push(path, operation);
        }
        api
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self, ApiLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| ApiLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let api = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };

        tracing::info!(
            path = %path.display(),
            operations = api.entries.len(),
            schemas = api.components.schemas.len(),
            "API description loaded"
        );
        Ok(api)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ApiLoadError> {
        Self::from_value(serde_json::from_str(content)?)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ApiLoadError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
        Self::from_value(yaml_to_json(yaml))
    }

    pub fn from_value(document: Value) -> Result<Self, ApiLoadError> {
        let raw: RawDocument = serde_json::from_value(document)?;

        let components = Components {
            schemas: raw.components.schemas.into_iter().collect(),
        };
        let mut api = Self {
            components: Arc::new(components),
            ..Self::default()
        };

        for (template, item) in raw.paths {
            let path = RoutePath::parse(&template)?;
            let Value::Object(item) = item else {
                continue;
            };

            for (key, value) in item {
                let Some(method_name) = METHODS.iter().find(|m| key.eq_ignore_ascii_case(m))
                else {
                    continue;
                };
                let method = Method::from_bytes(method_name.to_ascii_uppercase().as_bytes())
                    .unwrap_or(Method::GET);

                let raw_op: RawOperation = serde_json::from_value(value)?;
                let mut operation = Operation::new(method);
                for (status, response) in raw_op.responses {
                    let response = resolve_response(response, &raw.components.responses)?;
                    let spec: ResponseSpec = serde_json::from_value(response)?;
                    operation = operation.with_response(status, spec);
                }
                api.push(path.clone(), operation);
            }
        }

        Ok(api)
    }

    fn push(&mut self, path: RoutePath, operation: Operation) {
        let operation = Arc::new(operation);
        self.index.insert(
            (operation.method.clone(), path.to_string()),
            operation.clone(),
        );
        self.entries.push(OperationEntry { path, operation });
    }

    /// Find the operation declared for a method on a normalized template.
    pub fn operation(&self, method: &Method, template: &str) -> Option<Arc<Operation>> {
        self.index
            .get(&(method.clone(), template.to_string()))
            .cloned()
    }

    pub fn operations(&self) -> &[OperationEntry] {
        &self.entries
    }

    pub fn components(&self) -> Arc<Components> {
        self.components.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn resolve_response(
    response: Value,
    shared: &HashMap<String, Value>,
) -> Result<Value, ApiLoadError> {
    let Some(reference) = response.get("$ref").and_then(Value::as_str) else {
        return Ok(response);
    };
    reference
        .strip_prefix(RESPONSE_PREFIX)
        .and_then(|name| shared.get(name))
        .cloned()
        .ok_or_else(|| ApiLoadError::UnresolvedResponse(reference.to_string()))
}

/// YAML allows non-string keys (`200:`), JSON does not; stringify them.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(key, value)| (yaml_key(key), yaml_to_json(value)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
