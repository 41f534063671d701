//! Helpers handed to handlers alongside the response factory.

use std::sync::Arc;

use serde_json::Value;

use crate::api::schema::Schema;
use crate::response::negotiation::AcceptList;
use crate::response::random::SchemaGenerator;

/// Per-request utilities: Accept checks and randomness.
#[derive(Debug, Clone)]
pub struct Tools {
    accept: Arc<AcceptList>,
    generator: Arc<SchemaGenerator>,
}

impl Tools {
    pub fn new(accept: Arc<AcceptList>, generator: Arc<SchemaGenerator>) -> Self {
        Self { accept, generator }
    }

    /// Whether the client would accept `content_type`.
    pub fn accepts(&self, content_type: &str) -> bool {
        self.accept.accepts(content_type)
    }

    /// A uniformly chosen element. Deterministic under a configured seed.
    pub fn one_of<'a, T>(&self, candidates: &'a [T]) -> Option<&'a T> {
        self.generator
            .pick_index(candidates.len())
            .map(|idx| &candidates[idx])
    }

    /// A random value conforming to `schema`; `$ref`s resolve against the
    /// loaded document's components.
    pub fn random_from_schema(&self, schema: &Schema) -> Value {
        self.generator.generate(schema)
    }
}
