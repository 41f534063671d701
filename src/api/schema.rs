//! JSON-Schema subset used for response bodies and headers.
//!
//! Unknown keywords are ignored and unknown `type` names deserialize to
//! [`SchemaType::Unknown`] so a sloppy document never fails to load; the
//! generator treats anything it cannot interpret as a minimal value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single JSON-Schema type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Null,
    #[serde(other)]
    Unknown,
}

/// `type` is either one name or (OpenAPI 3.1) a list of names.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SchemaTypes {
    One(SchemaType),
    Many(Vec<SchemaType>),
}

impl SchemaTypes {
    /// The first non-null type, falling back to `null` when that is all there is.
    pub fn primary(&self) -> Option<SchemaType> {
        match self {
            SchemaTypes::One(t) => Some(*t),
            SchemaTypes::Many(types) => types
                .iter()
                .copied()
                .find(|t| *t != SchemaType::Null)
                .or_else(|| types.first().copied()),
        }
    }
}

/// `additionalProperties` is a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaTypes>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    /// JSON-Schema `examples` array. Anything else under this key is ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    pub nullable: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
}

impl Schema {
    /// Shorthand for a schema with only a `type`.
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(SchemaTypes::One(schema_type)),
            ..Self::default()
        }
    }

    /// `{"type": "array", "items": items}`.
    pub fn array_of(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_type(SchemaType::Array)
        }
    }

    /// `{"$ref": reference}`.
    pub fn from_ref(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    /// The declared type, or the one implied by the keywords present.
    pub fn effective_type(&self) -> Option<SchemaType> {
        if let Some(types) = &self.schema_type {
            return types.primary();
        }
        if !self.properties.is_empty() || self.additional_properties.is_some() {
            return Some(SchemaType::Object);
        }
        if self.items.is_some() {
            return Some(SchemaType::Array);
        }
        None
    }

    /// The first usable example: `example`, then the head of `examples`.
    pub fn first_example(&self) -> Option<&Value> {
        self.example.as_ref().or_else(|| match &self.examples {
            Some(Value::Array(values)) => values.first(),
            _ => None,
        })
    }
}

/// Named schemas from `#/components/schemas`.
#[derive(Debug, Clone, Default)]
pub struct Components {
    pub schemas: BTreeMap<String, Schema>,
}

impl Components {
    const SCHEMA_PREFIX: &'static str = "#/components/schemas/";

    /// Resolve a local `$ref`. External references are not followed.
    pub fn resolve(&self, reference: &str) -> Option<&Schema> {
        reference
            .strip_prefix(Self::SCHEMA_PREFIX)
            .and_then(|name| self.schemas.get(name))
    }
}
