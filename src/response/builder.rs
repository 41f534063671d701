//! Response builder bound to an operation's declared responses.
//!
//! A [`ResponseFactory`] is handed to every handler. `factory.status("200")`
//! yields a [`ResponseBuilder`] that only accepts bodies whose media type the
//! operation declares for that status. Negotiation against the request's
//! Accept header happens once, in [`ResponseBuilder::finish`].

use std::sync::Arc;

use axum::body::Bytes;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::api::operation::{Operation, ResponseSpec};
use crate::response::negotiation::{covers, is_json, AcceptList};
use crate::response::random::SchemaGenerator;
use crate::response::MockResponse;

/// Errors raised by handlers while building a response.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("{0:?} is not a status code, range or \"default\"")]
    InvalidStatus(String),

    #[error("status {0} is not declared for this operation")]
    UndeclaredStatus(String),

    #[error("{content_type} is not declared for status {status}")]
    UndeclaredMediaType { content_type: String, status: String },

    #[error("failed to serialize body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Creates response builders for one request.
#[derive(Debug, Clone)]
pub struct ResponseFactory {
    operation: Option<Arc<Operation>>,
    accept: Arc<AcceptList>,
    generator: Arc<SchemaGenerator>,
}

impl ResponseFactory {
    pub fn new(
        operation: Option<Arc<Operation>>,
        accept: Arc<AcceptList>,
        generator: Arc<SchemaGenerator>,
    ) -> Self {
        Self {
            operation,
            accept,
            generator,
        }
    }

    /// The declared operation, if the route has one.
    pub fn operation(&self) -> Option<&Operation> {
        self.operation.as_deref()
    }

    pub fn accept(&self) -> &AcceptList {
        &self.accept
    }

    /// The label a handler-less route answers with.
    pub fn default_status(&self) -> String {
        self.operation
            .as_ref()
            .and_then(|op| op.default_status())
            .unwrap_or("200")
            .to_string()
    }

    /// Start a response for a status label: `"200"`, `"2XX"` or `"default"`.
    ///
    /// Routes without a declared operation accept any label and any media type.
    pub fn status(&self, label: &str) -> Result<ResponseBuilder, ResponseError> {
        let spec = match &self.operation {
            Some(op) => Some(
                op.response(label)
                    .cloned()
                    .ok_or_else(|| ResponseError::UndeclaredStatus(label.to_string()))?,
            ),
            None => None,
        };
        let status = status_code(label, self.operation.as_deref())?;

        Ok(ResponseBuilder {
            status,
            label: label.to_string(),
            spec,
            bodies: Vec::new(),
            headers: Vec::new(),
            accept: self.accept.clone(),
            generator: self.generator.clone(),
        })
    }
}

/// Map a status label to the code sent on the wire.
///
/// `"default"` answers 500 when the operation declares a success response and
/// 200 when it does not (it then stands in for the success case).
fn status_code(label: &str, operation: Option<&Operation>) -> Result<u16, ResponseError> {
    let invalid = || ResponseError::InvalidStatus(label.to_string());

    if label.eq_ignore_ascii_case("default") {
        let has_success = operation
            .map(|op| op.responses.iter().any(|(l, _)| l.starts_with('2')))
            .unwrap_or(false);
        return Ok(if has_success { 500 } else { 200 });
    }

    let bytes = label.as_bytes();
    if bytes.len() == 3 && bytes[1..].eq_ignore_ascii_case(b"xx") {
        return match bytes[0] {
            d @ b'1'..=b'5' => Ok(u16::from(d - b'0') * 100),
            _ => Err(invalid()),
        };
    }

    match label.parse::<u16>() {
        Ok(code) if (100..=599).contains(&code) => Ok(code),
        _ => Err(invalid()),
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    declared: Option<usize>,
    content_type: String,
    bytes: Bytes,
}

/// Accumulates candidate bodies and headers for one status.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status: u16,
    label: String,
    spec: Option<Arc<ResponseSpec>>,
    bodies: Vec<Candidate>,
    headers: Vec<(String, String)>,
    accept: Arc<AcceptList>,
    generator: Arc<SchemaGenerator>,
}

impl ResponseBuilder {
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Override the wire status (e.g. 201 for a `2XX` label).
    pub fn status_code(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn text(self, body: impl Into<String>) -> Result<Self, ResponseError> {
        self.matching("text/plain", body.into())
    }

    pub fn html(self, body: impl Into<String>) -> Result<Self, ResponseError> {
        self.matching("text/html", body.into())
    }

    /// Serialize `body` for the first declared JSON media type.
    pub fn json<T: Serialize>(self, body: T) -> Result<Self, ResponseError> {
        let content_type = self
            .spec
            .as_ref()
            .and_then(|spec| spec.media_types().find(|m| is_json(m)).map(str::to_string))
            .unwrap_or_else(|| "application/json".to_string());
        let bytes = serde_json::to_vec(&body)?;
        self.matching(&content_type, bytes)
    }

    /// Provide a body for an explicit media type.
    pub fn matching(
        mut self,
        content_type: &str,
        body: impl Into<Bytes>,
    ) -> Result<Self, ResponseError> {
        let (declared, content_type) = self.resolve(content_type)?;
        self.push(declared, content_type, body.into());
        Ok(self)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Synthesize a body for every declared media type and a value for every
    /// declared header not already set. Examples win over generated data.
    pub fn random(mut self) -> Self {
        let Some(spec) = self.spec.clone() else {
            return self;
        };

        for (idx, (media, declared)) in spec.content.iter().enumerate() {
            let value = match (declared.first_example(), &declared.schema) {
                (Some(example), _) => example.clone(),
                (None, Some(schema)) => self.generator.generate(schema),
                (None, None) => continue,
            };

            let (content_type, bytes) = if media.contains('*') {
                ("application/json".to_string(), json_bytes(&value))
            } else if is_json(media) {
                (media.clone(), json_bytes(&value))
            } else {
                (media.clone(), Bytes::from(plain_text(&value)))
            };
            self.push(Some(idx), content_type, bytes);
        }

        for (name, header) in &spec.headers {
            let already_set = self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name));
            if let (false, Some(schema)) = (already_set, &header.schema) {
                let value = self.generator.generate(schema);
                self.headers.push((name.clone(), plain_text(&value)));
            }
        }

        self
    }

    /// Negotiate and produce the final response.
    pub fn finish(mut self) -> MockResponse {
        if self.bodies.is_empty() {
            return MockResponse {
                headers: self.headers,
                ..MockResponse::new(self.status)
            };
        }

        self.bodies.sort_by_key(|c| c.declared);
        let Some(chosen) = self
            .bodies
            .into_iter()
            .find(|c| self.accept.accepts(&c.content_type))
        else {
            return MockResponse::unsupported_media_type();
        };

        MockResponse {
            status: self.status,
            content_type: Some(chosen.content_type),
            headers: self.headers,
            body: chosen.bytes,
        }
    }

    fn resolve(&self, requested: &str) -> Result<(Option<usize>, String), ResponseError> {
        let Some(spec) = &self.spec else {
            return Ok((None, requested.to_string()));
        };

        spec.content
            .iter()
            .enumerate()
            .find(|(_, (declared, _))| covers(declared, requested))
            .map(|(idx, (declared, _))| {
                let content_type = if declared.contains('*') {
                    requested.to_string()
                } else {
                    declared.clone()
                };
                (Some(idx), content_type)
            })
            .ok_or_else(|| ResponseError::UndeclaredMediaType {
                content_type: requested.to_string(),
                status: self.label.clone(),
            })
    }

    fn push(&mut self, declared: Option<usize>, content_type: String, bytes: Bytes) {
        self.bodies
            .retain(|c| !(c.declared == declared && c.content_type == content_type));
        self.bodies.push(Candidate {
            declared,
            content_type,
            bytes,
        });
    }
}

impl From<ResponseBuilder> for MockResponse {
    fn from(builder: ResponseBuilder) -> Self {
        builder.finish()
    }
}

fn json_bytes(value: &Value) -> Bytes {
    Bytes::from(serde_json::to_vec(value).unwrap_or_default())
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::schema::{Components, Schema, SchemaType};
    use axum::http::Method;
    use serde_json::json;

    fn factory(operation: Option<Operation>, accept: Option<&str>) -> ResponseFactory {
        ResponseFactory::new(
            operation.map(Arc::new),
            Arc::new(AcceptList::parse(accept)),
            Arc::new(SchemaGenerator::seeded(Arc::new(Components::default()), 8, 1)),
        )
    }

    fn pet_operation() -> Operation {
        let pet = Schema {
            required: vec!["name".into()],
            properties: [("name".to_string(), Schema::of_type(SchemaType::String))]
                .into_iter()
                .collect(),
            ..Schema::of_type(SchemaType::Object)
        };
        Operation::new(Method::GET)
            .with_response(
                "200",
                ResponseSpec::new()
                    .with_content("application/xml", Schema::of_type(SchemaType::String))
                    .with_content("application/json", pet)
                    .with_header("x-rate-limit", Schema::of_type(SchemaType::Integer)),
            )
            .with_response(
                "default",
                ResponseSpec::new().with_content("text/plain", Schema::of_type(SchemaType::String)),
            )
    }

    #[test]
    fn test_negotiates_json_when_accepted() {
        let response = factory(Some(pet_operation()), Some("application/json"))
            .status("200")
            .unwrap()
            .random()
            .finish();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
        let body: Value = serde_json::from_slice(&response.body).unwrap();
        assert!(body["name"].is_string());
        assert!(response.header("x-rate-limit").unwrap().parse::<i64>().is_ok());
    }

    #[test]
    fn test_unacceptable_media_type_yields_415() {
        let response = factory(Some(pet_operation()), Some("text/plain"))
            .status("200")
            .unwrap()
            .random()
            .finish();

        assert_eq!(response, MockResponse::unsupported_media_type());
    }

    #[test]
    fn test_declaration_order_wins_for_wildcard_accept() {
        let response = factory(Some(pet_operation()), None)
            .status("200")
            .unwrap()
            .json(json!({ "name": "Rex" }))
            .unwrap()
            .matching("application/xml", "<pet><name>Rex</name></pet>")
            .unwrap()
            .finish();

        assert_eq!(response.content_type.as_deref(), Some("application/xml"));
        assert_eq!(response.body_text(), "<pet><name>Rex</name></pet>");
    }

    #[test]
    fn test_undeclared_media_type_and_status_are_rejected() {
        let f = factory(Some(pet_operation()), None);

        let err = f.status("200").unwrap().html("<p>hi</p>").unwrap_err();
        assert!(matches!(err, ResponseError::UndeclaredMediaType { .. }));

        // 404 falls back to `default`, which declares text/plain.
        let response = f.status("404").unwrap().text("gone").unwrap().finish();
        assert_eq!(response.status, 404);
        assert_eq!(response.body_text(), "gone");

        let strict = Operation::new(Method::GET).with_response("200", ResponseSpec::new());
        let err = factory(Some(strict), None).status("404").unwrap_err();
        assert!(matches!(err, ResponseError::UndeclaredStatus(_)));
    }

    #[test]
    fn test_status_labels() {
        let f = factory(Some(pet_operation()), None);
        assert_eq!(f.status("default").unwrap().status(), 500);
        assert!(matches!(f.status("abc"), Err(ResponseError::InvalidStatus(_))));

        let undeclared = factory(None, None);
        assert_eq!(undeclared.status("2XX").unwrap().status(), 200);
        assert_eq!(undeclared.status("default").unwrap().status(), 200);
        assert!(matches!(undeclared.status("999"), Err(ResponseError::InvalidStatus(_))));
        assert!(matches!(undeclared.status("éx"), Err(ResponseError::InvalidStatus(_))));
        assert!(matches!(undeclared.status("6XX"), Err(ResponseError::InvalidStatus(_))));
    }

    #[test]
    fn test_permissive_without_operation() {
        let response = factory(None, Some("text/html"))
            .status("201")
            .unwrap()
            .html("<p>created</p>")
            .unwrap()
            .header("location", "/pet/1")
            .finish();

        assert_eq!(response.status, 201);
        assert_eq!(response.content_type.as_deref(), Some("text/html"));
        assert_eq!(response.header("location"), Some("/pet/1"));
    }

    #[test]
    fn test_empty_body_skips_negotiation() {
        let op = Operation::new(Method::DELETE).with_response("204", ResponseSpec::new());
        let response = factory(Some(op), Some("application/json"))
            .status("204")
            .unwrap()
            .random()
            .finish();
        assert_eq!(response.status, 204);
        assert!(response.body.is_empty());
        assert_eq!(response.content_type, None);
    }
}
