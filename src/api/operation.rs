//! Operations and their declared responses.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use axum::http::Method;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::api::schema::Schema;

/// One declared media type of a response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MediaType {
    pub schema: Option<Schema>,
    pub example: Option<Value>,
    /// OpenAPI `examples` map (name -> `{ value }`); only the values are kept.
    #[serde(deserialize_with = "example_values")]
    pub examples: Vec<Value>,
}

impl MediaType {
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema: Some(schema),
            ..Self::default()
        }
    }

    /// The first example declared on the media type or its schema.
    pub fn first_example(&self) -> Option<&Value> {
        self.example
            .as_ref()
            .or_else(|| self.examples.first())
            .or_else(|| self.schema.as_ref().and_then(Schema::first_example))
    }
}

/// A declared response header.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeaderSpec {
    pub schema: Option<Schema>,
}

/// Content and headers declared for one status code.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResponseSpec {
    /// Media types in declaration order.
    #[serde(deserialize_with = "ordered_map")]
    pub content: Vec<(String, MediaType)>,
    pub headers: BTreeMap<String, HeaderSpec>,
}

impl ResponseSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper used by programmatic route manifests and tests.
    pub fn with_content(mut self, media_type: impl Into<String>, schema: Schema) -> Self {
        self.content
            .push((media_type.into(), MediaType::with_schema(schema)));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.headers.insert(
            name.into(),
            HeaderSpec {
                schema: Some(schema),
            },
        );
        self
    }

    pub fn media_types(&self) -> impl Iterator<Item = &str> {
        self.content.iter().map(|(name, _)| name.as_str())
    }

    pub fn media_type(&self, name: &str) -> Option<&MediaType> {
        self.content
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, media)| media)
    }
}

/// An operation: a method on a path template with its possible responses.
#[derive(Debug, Clone)]
pub struct Operation {
    pub method: Method,
    /// Status label (`"200"`, `"4XX"`, `"default"`) -> response, in declaration order.
    pub responses: Vec<(String, Arc<ResponseSpec>)>,
}

impl Operation {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            responses: Vec::new(),
        }
    }

    pub fn with_response(mut self, status: impl Into<String>, spec: ResponseSpec) -> Self {
        self.responses.push((status.into(), Arc::new(spec)));
        self
    }

    /// Look up the response for a status label.
    ///
    /// A concrete code falls back to its range (`"2XX"`) and then to `"default"`.
    pub fn response(&self, label: &str) -> Option<&Arc<ResponseSpec>> {
        let exact = self.find(label);
        if exact.is_some() || label.eq_ignore_ascii_case("default") {
            return exact;
        }
        let range = label
            .chars()
            .next()
            .filter(|c| c.is_ascii_digit())
            .map(|c| format!("{}XX", c));
        range
            .and_then(|r| self.find(&r))
            .or_else(|| self.find("default"))
    }

    /// The status a handler-less route answers with: first 2xx, else `default`,
    /// else whatever was declared first.
    pub fn default_status(&self) -> Option<&str> {
        self.responses
            .iter()
            .map(|(label, _)| label.as_str())
            .find(|label| label.starts_with('2'))
            .or_else(|| {
                self.responses
                    .iter()
                    .map(|(label, _)| label.as_str())
                    .find(|label| label.eq_ignore_ascii_case("default"))
            })
            .or_else(|| self.responses.first().map(|(label, _)| label.as_str()))
    }

    fn find(&self, label: &str) -> Option<&Arc<ResponseSpec>> {
        self.responses
            .iter()
            .find(|(declared, _)| declared.eq_ignore_ascii_case(label))
            .map(|(_, spec)| spec)
    }
}

/// Deserialize a map into a vector that keeps document order.
pub(crate) fn ordered_map<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct OrderedVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedVisitor(PhantomData))
}

fn example_values<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let examples: Vec<(String, Value)> = ordered_map(deserializer)?;
    Ok(examples
        .into_iter()
        .filter_map(|(_, example)| example.get("value").cloned())
        .collect())
}
