//! Segment tree mapping method + path to a handler.
//!
//! # Responsibilities
//! - Store handlers at terminal nodes, keyed by HTTP method
//! - Match literal children before parameter children, backtracking on failure
//! - Distinguish "no such path" from "path exists, method does not"
//!
//! # Design Decisions
//! - Immutable once published; the module registry rebuilds and swaps it
//! - Parameter children with different names at the same depth are kept apart
//!   (`/users/{id}/posts` vs `/users/{userId}/likes`)
//! - Parameter values are returned raw; coercion is up to the handler

use std::collections::HashMap;

use axum::http::Method;

use crate::routing::path::{split_segments, RouteError, RoutePath, Segment};

/// Result of a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteMatch<H> {
    Found {
        handler: H,
        params: HashMap<String, String>,
        template: RoutePath,
    },
    MethodNotAllowed {
        allowed: Vec<Method>,
    },
    NotFound,
}

#[derive(Debug, Clone)]
struct Node<H> {
    handlers: HashMap<Method, H>,
    template: Option<RoutePath>,
    literals: HashMap<String, Node<H>>,
    params: Vec<(String, Node<H>)>,
}

impl<H> Default for Node<H> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            template: None,
            literals: HashMap::new(),
            params: Vec::new(),
        }
    }
}

enum Search<'a, H> {
    Found(&'a H, &'a RoutePath),
    MethodNotAllowed(Vec<Method>),
    Miss,
}

impl<H> Node<H> {
    fn child_mut(&mut self, segment: &Segment) -> &mut Node<H> {
        match segment {
            Segment::Literal(value) => self.literals.entry(value.clone()).or_default(),
            Segment::Parameter(name) => {
                let idx = match self.params.iter().position(|(n, _)| n == name) {
                    Some(idx) => idx,
                    None => {
                        self.params.push((name.clone(), Node::default()));
                        self.params.len() - 1
                    }
                };
                &mut self.params[idx].1
            }
        }
    }

    fn search<'a>(
        &'a self,
        segments: &[&str],
        method: &Method,
        params: &mut Vec<(String, String)>,
    ) -> Search<'a, H> {
        let Some((head, rest)) = segments.split_first() else {
            if self.handlers.is_empty() {
                return Search::Miss;
            }
            return match (self.handlers.get(method), &self.template) {
                (Some(handler), Some(template)) => Search::Found(handler, template),
                _ => {
                    let mut allowed: Vec<Method> = self.handlers.keys().cloned().collect();
                    allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                    Search::MethodNotAllowed(allowed)
                }
            };
        };

        let mut not_allowed = None;

        if let Some(child) = self.literals.get(*head) {
            match child.search(rest, method, params) {
                found @ Search::Found(..) => return found,
                Search::MethodNotAllowed(allowed) => not_allowed = Some(allowed),
                Search::Miss => {}
            }
        }

        if !head.is_empty() {
            for (name, child) in &self.params {
                params.push((name.clone(), (*head).to_string()));
                match child.search(rest, method, params) {
                    found @ Search::Found(..) => return found,
                    Search::MethodNotAllowed(allowed) => {
                        not_allowed.get_or_insert(allowed);
                    }
                    Search::Miss => {}
                }
                params.pop();
            }
        }

        match not_allowed {
            Some(allowed) => Search::MethodNotAllowed(allowed),
            None => Search::Miss,
        }
    }

    fn collect<'a>(&'a self, out: &mut Vec<(&'a RoutePath, Vec<Method>)>) {
        if let Some(template) = &self.template {
            if !self.handlers.is_empty() {
                let mut methods: Vec<Method> = self.handlers.keys().cloned().collect();
                methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                out.push((template, methods));
            }
        }
        for child in self.literals.values() {
            child.collect(out);
        }
        for (_, child) in &self.params {
            child.collect(out);
        }
    }
}

/// Route tree over handler references of type `H`.
#[derive(Debug, Clone)]
pub struct RouteTree<H> {
    root: Node<H>,
    len: usize,
}

impl<H> Default for RouteTree<H> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }
}

impl<H: Clone> RouteTree<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A second handler for the same method and template
    /// is rejected.
    pub fn insert(&mut self, method: Method, path: &RoutePath, handler: H) -> Result<(), RouteError> {
        let mut node = &mut self.root;
        for segment in path.segments() {
            node = node.child_mut(segment);
        }

        if node.handlers.contains_key(&method) {
            return Err(RouteError::DuplicateRoute {
                method: method.to_string(),
                template: path.to_string(),
            });
        }

        node.template.get_or_insert_with(|| path.clone());
        node.handlers.insert(method, handler);
        self.len += 1;
        Ok(())
    }

    /// Match a concrete request path.
    pub fn lookup(&self, method: &Method, path: &str) -> RouteMatch<H> {
        let segments = split_segments(path);
        let mut params = Vec::new();

        match self.root.search(&segments, method, &mut params) {
            Search::Found(handler, template) => RouteMatch::Found {
                handler: handler.clone(),
                params: params.into_iter().collect(),
                template: template.clone(),
            },
            Search::MethodNotAllowed(allowed) => RouteMatch::MethodNotAllowed { allowed },
            Search::Miss => RouteMatch::NotFound,
        }
    }

    /// Every registered template with its methods, sorted by template.
    pub fn routes(&self) -> Vec<(RoutePath, Vec<Method>)> {
        let mut out = Vec::new();
        self.root.collect(&mut out);
        let mut routes: Vec<(RoutePath, Vec<Method>)> = out
            .into_iter()
            .map(|(template, methods)| (template.clone(), methods))
            .collect();
        routes.sort_by_key(|(template, _)| template.to_string());
        routes
    }

    /// Number of (method, template) registrations.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(routes: &[(&str, &str, &'static str)]) -> RouteTree<&'static str> {
        let mut tree = RouteTree::new();
        for (method, path, name) in routes {
            let method = Method::from_bytes(method.as_bytes()).unwrap();
            tree.insert(method, &RoutePath::parse(path).unwrap(), *name)
                .unwrap();
        }
        tree
    }

    fn found(result: RouteMatch<&'static str>) -> (&'static str, HashMap<String, String>) {
        match result {
            RouteMatch::Found { handler, params, .. } => (handler, params),
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn test_literal_wins_over_parameter() {
        let tree = tree(&[
            ("GET", "/pet/{petId}", "by-id"),
            ("GET", "/pet/findByStatus", "by-status"),
        ]);

        let (handler, params) = found(tree.lookup(&Method::GET, "/pet/findByStatus"));
        assert_eq!(handler, "by-status");
        assert!(params.is_empty());

        let (handler, params) = found(tree.lookup(&Method::GET, "/pet/42"));
        assert_eq!(handler, "by-id");
        assert_eq!(params["petId"], "42");
    }

    #[test]
    fn test_backtracks_into_parameter_branch() {
        let tree = tree(&[
            ("GET", "/pet/findByStatus", "literal"),
            ("GET", "/pet/{petId}/photos", "photos"),
        ]);

        let (handler, params) = found(tree.lookup(&Method::GET, "/pet/findByStatus/photos"));
        assert_eq!(handler, "photos");
        assert_eq!(params["petId"], "findByStatus");
    }

    #[test]
    fn test_method_not_allowed_vs_not_found() {
        let tree = tree(&[("GET", "/pet/{petId}", "get"), ("DELETE", "/pet/{petId}", "delete")]);

        assert_eq!(
            tree.lookup(&Method::POST, "/pet/1"),
            RouteMatch::MethodNotAllowed {
                allowed: vec![Method::DELETE, Method::GET]
            }
        );
        assert_eq!(tree.lookup(&Method::GET, "/pet"), RouteMatch::NotFound);
        assert_eq!(tree.lookup(&Method::GET, "/pet/1/extra"), RouteMatch::NotFound);
        assert_eq!(tree.lookup(&Method::GET, "/store"), RouteMatch::NotFound);
    }

    #[test]
    fn test_method_found_in_later_branch_beats_not_allowed() {
        let tree = tree(&[
            ("GET", "/pet/findByStatus", "literal-get"),
            ("POST", "/pet/{petId}", "param-post"),
        ]);

        let (handler, params) = found(tree.lookup(&Method::POST, "/pet/findByStatus"));
        assert_eq!(handler, "param-post");
        assert_eq!(params["petId"], "findByStatus");
    }

    #[test]
    fn test_trailing_slash_and_root() {
        let tree = tree(&[("GET", "/", "root"), ("GET", "/store/inventory", "inventory")]);

        assert_eq!(found(tree.lookup(&Method::GET, "/")).0, "root");
        assert_eq!(found(tree.lookup(&Method::GET, "")).0, "root");
        assert_eq!(found(tree.lookup(&Method::GET, "/store/inventory/")).0, "inventory");
        assert_eq!(tree.lookup(&Method::GET, "/Store/Inventory"), RouteMatch::NotFound);
    }

    #[test]
    fn test_parameter_rejects_empty_segment() {
        let tree = tree(&[("GET", "/a/{x}/b", "a")]);
        assert_eq!(tree.lookup(&Method::GET, "/a//b"), RouteMatch::NotFound);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut tree = tree(&[("GET", "/pet/{petId}", "first")]);
        let err = tree
            .insert(Method::GET, &RoutePath::parse("/pet/{petId}/").unwrap(), "second")
            .unwrap_err();
        assert!(matches!(err, RouteError::DuplicateRoute { .. }));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_distinct_parameter_names_share_depth() {
        let tree = tree(&[
            ("GET", "/users/{id}/posts", "posts"),
            ("GET", "/users/{userId}/likes", "likes"),
        ]);

        let (handler, params) = found(tree.lookup(&Method::GET, "/users/7/likes"));
        assert_eq!(handler, "likes");
        assert_eq!(params["userId"], "7");
        assert!(!params.contains_key("id"));
    }

    #[test]
    fn test_routes_listing() {
        let tree = tree(&[
            ("POST", "/pet", "add"),
            ("GET", "/pet/{petId}", "get"),
            ("PUT", "/pet", "update"),
        ]);
        let routes = tree.routes();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].0.to_string(), "/pet");
        assert_eq!(routes[0].1, vec![Method::POST, Method::PUT]);
    }
}
