//! Schema-driven random value generation.
//!
//! # Responsibilities
//! - Produce a JSON value conforming to a [`Schema`]
//! - Follow local `$ref`s, bounded by an explicit depth counter
//! - Prefer declared examples and enums over invented data
//!
//! # Design Decisions
//! - Total: never fails; unknown or malformed schemas produce `null`
//! - At the depth limit a minimal conforming value is returned instead of recursing
//! - All randomness comes from one `StdRng`; seeding it makes output reproducible

use std::sync::{Arc, Mutex, PoisonError};

use fake::faker::internet::en::{IPv4, SafeEmail};
use fake::faker::lorem::en::{Word, Words};
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Number, Value};

use crate::api::schema::{AdditionalProperties, Components, Schema, SchemaType};

/// Default bound on nested schema expansion.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// How many extra levels `minimal` may descend to satisfy `required`.
const MINIMAL_BUDGET: usize = 2;

const DEFAULT_MAX_EXTRA_ITEMS: usize = 4;

/// Upper bound on generated array lengths, whatever `minItems` asks for.
pub const MAX_GENERATED_ITEMS: usize = 64;

/// Upper bound on generated string lengths, whatever `minLength` asks for.
pub const MAX_GENERATED_LENGTH: usize = 4096;

/// Generates schema-conformant values.
#[derive(Debug)]
pub struct SchemaGenerator {
    components: Arc<Components>,
    max_depth: usize,
    rng: Mutex<StdRng>,
}

impl SchemaGenerator {
    /// A generator seeded from OS entropy.
    pub fn new(components: Arc<Components>, max_depth: usize) -> Self {
        Self::from_rng(components, max_depth, StdRng::from_entropy())
    }

    /// A deterministic generator.
    pub fn seeded(components: Arc<Components>, max_depth: usize, seed: u64) -> Self {
        Self::from_rng(components, max_depth, StdRng::seed_from_u64(seed))
    }

    fn from_rng(components: Arc<Components>, max_depth: usize, rng: StdRng) -> Self {
        Self {
            components,
            max_depth: max_depth.max(1),
            rng: Mutex::new(rng),
        }
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Generate a value for `schema`.
    pub fn generate(&self, schema: &Schema) -> Value {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.value_for(&mut rng, schema, 0)
    }

    /// Uniformly pick an index in `0..len`; `None` when `len` is zero.
    pub fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Some(rng.gen_range(0..len))
    }

    fn value_for(&self, rng: &mut StdRng, schema: &Schema, depth: usize) -> Value {
        if depth >= self.max_depth {
            return self.minimal(schema, MINIMAL_BUDGET);
        }

        if let Some(reference) = &schema.reference {
            return match self.components.resolve(reference) {
                Some(target) => self.value_for(rng, target, depth + 1),
                None => {
                    tracing::debug!(reference = %reference, "Unresolved schema reference");
                    Value::Null
                }
            };
        }

        if let Some(example) = schema.first_example() {
            return example.clone();
        }

        if let Some(values) = schema.enum_values.as_ref().filter(|v| !v.is_empty()) {
            return values[rng.gen_range(0..values.len())].clone();
        }

        if !schema.all_of.is_empty() {
            return self.merge_all_of(rng, &schema.all_of, depth);
        }

        let choices = if !schema.one_of.is_empty() {
            &schema.one_of
        } else {
            &schema.any_of
        };
        if !choices.is_empty() {
            let pick = &choices[rng.gen_range(0..choices.len())];
            return self.value_for(rng, pick, depth + 1);
        }

        match schema.effective_type() {
            Some(SchemaType::String) => Value::String(self.string(rng, schema)),
            Some(SchemaType::Integer) => Value::from(self.integer(rng, schema)),
            Some(SchemaType::Number) => self.number(rng, schema),
            Some(SchemaType::Boolean) => Value::Bool(rng.gen_bool(0.5)),
            Some(SchemaType::Array) => self.array(rng, schema, depth),
            Some(SchemaType::Object) => self.object(rng, schema, depth),
            Some(SchemaType::Null) | Some(SchemaType::Unknown) | None => Value::Null,
        }
    }

    fn merge_all_of(&self, rng: &mut StdRng, parts: &[Schema], depth: usize) -> Value {
        let mut merged = Map::new();
        let mut last = Value::Null;
        for part in parts {
            match self.value_for(rng, part, depth + 1) {
                Value::Object(fields) => merged.extend(fields),
                other => last = other,
            }
        }
        if merged.is_empty() {
            last
        } else {
            Value::Object(merged)
        }
    }

    fn string(&self, rng: &mut StdRng, schema: &Schema) -> String {
        let formatted = match schema.format.as_deref() {
            Some("date-time") => Some(format!("{}T{}Z", date(rng), time(rng))),
            Some("date") => Some(date(rng)),
            Some("time") => Some(time(rng)),
            Some("email") => Some(SafeEmail().fake_with_rng::<String, _>(rng)),
            Some("uuid") => Some(
                uuid::Builder::from_random_bytes(rng.gen())
                    .into_uuid()
                    .to_string(),
            ),
            Some("uri") | Some("url") => Some(format!(
                "https://{}.example.com/{}",
                Word().fake_with_rng::<String, _>(rng),
                Word().fake_with_rng::<String, _>(rng)
            )),
            Some("hostname") => Some(format!(
                "{}.example.com",
                Word().fake_with_rng::<String, _>(rng)
            )),
            Some("ipv4") => Some(IPv4().fake_with_rng::<String, _>(rng)),
            _ => None,
        };
        if let Some(value) = formatted {
            return value;
        }

        let min = schema.min_length.unwrap_or(0).min(MAX_GENERATED_LENGTH);
        let max = schema.max_length.unwrap_or(usize::MAX).max(min);

        let mut text = Words(1..4)
            .fake_with_rng::<Vec<String>, _>(rng)
            .join(" ");
        while text.chars().count() < min {
            text.push_str(&Word().fake_with_rng::<String, _>(rng));
        }
        if text.chars().count() > max {
            text = text.chars().take(max).collect();
        }
        text
    }

    fn integer(&self, rng: &mut StdRng, schema: &Schema) -> i64 {
        let (lo, hi) = bounds(schema, 1000.0);
        let lo = lo.ceil() as i64;
        let hi = (hi.floor() as i64).max(lo);
        rng.gen_range(lo..=hi)
    }

    fn number(&self, rng: &mut StdRng, schema: &Schema) -> Value {
        let (lo, hi) = bounds(schema, 1000.0);
        let raw = if hi <= lo {
            lo
        } else if (hi - lo).is_finite() {
            rng.gen_range(lo..hi)
        } else {
            // The span overflows f64; scale the halves instead.
            (lo + rng.gen::<f64>() * (hi / 2.0 - lo / 2.0) * 2.0).clamp(lo, hi)
        };
        let rounded = (raw * 100.0).round() / 100.0;
        let value = if rounded < lo || rounded > hi { raw } else { rounded };
        Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(0))
    }

    fn array(&self, rng: &mut StdRng, schema: &Schema, depth: usize) -> Value {
        let Some(items) = &schema.items else {
            return Value::Array(Vec::new());
        };
        let min = schema.min_items.unwrap_or(1).min(MAX_GENERATED_ITEMS);
        let max = schema
            .max_items
            .unwrap_or(min.saturating_add(DEFAULT_MAX_EXTRA_ITEMS))
            .clamp(min, MAX_GENERATED_ITEMS);
        let count = rng.gen_range(min..=max);
        Value::Array(
            (0..count)
                .map(|_| self.value_for(rng, items, depth + 1))
                .collect(),
        )
    }

    fn object(&self, rng: &mut StdRng, schema: &Schema, depth: usize) -> Value {
        let mut fields = Map::new();
        for (name, property) in &schema.properties {
            fields.insert(name.clone(), self.value_for(rng, property, depth + 1));
        }
        for name in &schema.required {
            if !fields.contains_key(name) {
                fields.insert(name.clone(), Value::String(Word().fake_with_rng(rng)));
            }
        }
        if fields.is_empty() {
            if let Some(AdditionalProperties::Schema(extra)) = &schema.additional_properties {
                fields.insert(
                    "additionalProp1".to_string(),
                    self.value_for(rng, extra, depth + 1),
                );
            }
        }
        Value::Object(fields)
    }

    /// Smallest value of the schema's type; objects keep their required keys
    /// while `budget` lasts.
    fn minimal(&self, schema: &Schema, budget: usize) -> Value {
        let schema = match &schema.reference {
            Some(reference) => match self.components.resolve(reference) {
                Some(target) => target,
                None => return Value::Null,
            },
            None => schema,
        };

        if let Some(example) = schema.first_example() {
            return example.clone();
        }
        if let Some(first) = schema.enum_values.as_ref().and_then(|v| v.first()) {
            return first.clone();
        }

        match schema.effective_type() {
            Some(SchemaType::String) => {
                Value::String("x".repeat(schema.min_length.unwrap_or(0).min(MAX_GENERATED_LENGTH)))
            }
            Some(SchemaType::Integer) => Value::from(bounds(schema, 0.0).0.ceil() as i64),
            Some(SchemaType::Number) => Number::from_f64(bounds(schema, 0.0).0)
                .map(Value::Number)
                .unwrap_or_else(|| Value::from(0)),
            Some(SchemaType::Boolean) => Value::Bool(false),
            Some(SchemaType::Array) => Value::Array(Vec::new()),
            Some(SchemaType::Object) => {
                let mut fields = Map::new();
                if budget > 0 {
                    for name in &schema.required {
                        let value = schema
                            .properties
                            .get(name)
                            .map(|p| self.minimal(p, budget - 1))
                            .unwrap_or(Value::Null);
                        fields.insert(name.clone(), value);
                    }
                }
                Value::Object(fields)
            }
            Some(SchemaType::Null) | Some(SchemaType::Unknown) | None => Value::Null,
        }
    }
}

/// Inclusive numeric range from `minimum`/`maximum`, `span` wide when open.
fn bounds(schema: &Schema, span: f64) -> (f64, f64) {
    match (schema.minimum, schema.maximum) {
        (Some(lo), Some(hi)) if hi >= lo => (lo, hi),
        (Some(lo), Some(_)) => (lo, lo),
        (Some(lo), None) => (lo, lo + span),
        (None, Some(hi)) => (hi - span, hi),
        (None, None) => (0.0, span),
    }
}

fn date(rng: &mut StdRng) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        rng.gen_range(2000..=2030),
        rng.gen_range(1..=12),
        rng.gen_range(1..=28)
    )
}

fn time(rng: &mut StdRng) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        rng.gen_range(0..24),
        rng.gen_range(0..60),
        rng.gen_range(0..60)
    )
}
