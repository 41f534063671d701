//! Route path templates and path-prefix helpers.
//!
//! # Responsibilities
//! - Parse templates like `/pet/{petId}` into literal and parameter segments
//! - Normalize paths (trailing slashes stripped, matching is case-sensitive)
//! - Enumerate the ancestor prefixes of a path for longest-prefix lookups

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while parsing or registering routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("parameter name is empty in {0}")]
    EmptyParameter(String),

    #[error("parameter {{{name}}} appears twice in {template}")]
    DuplicateParameter { name: String, template: String },

    #[error("{method} {template} is already registered")]
    DuplicateRoute { method: String, template: String },
}

/// One segment of a route path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Parameter(String),
}

/// A parsed, normalized route template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RoutePath {
    segments: Vec<Segment>,
}

impl RoutePath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a template. Parameter names must be unique within one path.
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        let mut seen = HashSet::new();
        let mut segments = Vec::new();

        for raw in split_segments(template) {
            let segment = match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some("") => return Err(RouteError::EmptyParameter(template.to_string())),
                Some(name) => {
                    if !seen.insert(name) {
                        return Err(RouteError::DuplicateParameter {
                            name: name.to_string(),
                            template: template.to_string(),
                        });
                    }
                    Segment::Parameter(name.to_string())
                }
                None => Segment::Literal(raw.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Parameter(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// The prefix form used by the proxy and context registries (`""` for root).
    pub fn as_prefix(&self) -> String {
        if self.segments.is_empty() {
            String::new()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => write!(f, "/{}", s)?,
                Segment::Parameter(name) => write!(f, "/{{{}}}", name)?,
            }
        }
        Ok(())
    }
}

impl FromStr for RoutePath {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split a request path into segments. `/` and `` both yield no segments.
///
/// Only trailing slashes are dropped, so `/a//b` keeps its empty segment and
/// will not match a parameter.
pub fn split_segments(path: &str) -> Vec<&str> {
    let trimmed = path.trim_end_matches('/');
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// Normalize a path prefix: no trailing slash, leading slash, `""` for root.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Yield the path itself and then each ancestor prefix, ending with `""`.
///
/// Ancestry is segment-wise: `/foo` is an ancestor of `/foo/bar` but not of
/// `/foobar`.
pub fn ancestors(path: &str) -> impl Iterator<Item = String> {
    let mut next = Some(normalize_prefix(path));
    std::iter::from_fn(move || {
        let current = next.take()?;
        if !current.is_empty() {
            let parent = current
                .rfind('/')
                .map(|idx| current[..idx].to_string())
                .unwrap_or_default();
            next = Some(parent);
        }
        Some(current)
    })
}
