//! Handler modules and the route tree built from them.
//!
//! # Responsibilities
//! - Own the handler modules, keyed by route template
//! - Own the declared operations of the loaded API description
//! - Rebuild the route tree after every change and publish it atomically
//!
//! # Design Decisions
//! - Writers serialize on a mutex; readers only load the `ArcSwap` snapshot
//! - A request keeps the snapshot it started with, so a swap never affects it
//! - Declared operations without a module get [`default_handler`]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use axum::http::Method;

use crate::api::document::ApiDescription;
use crate::modules::handler::{default_handler, Handler, HandlerModule, RouteHandler};
use crate::routing::path::RoutePath;
use crate::routing::router::RouteTree;

#[derive(Debug)]
struct RegistryState {
    api: Arc<ApiDescription>,
    modules: BTreeMap<String, (RoutePath, HandlerModule)>,
}

/// The live set of handlers.
pub struct ModuleRegistry {
    state: Mutex<RegistryState>,
    tree: ArcSwap<RouteTree<RouteHandler>>,
    fallback: Arc<dyn Handler>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("routes", &self.tree.load().len())
            .finish()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new(Arc::new(ApiDescription::empty()))
    }
}

impl ModuleRegistry {
    pub fn new(api: Arc<ApiDescription>) -> Self {
        let registry = Self {
            state: Mutex::new(RegistryState {
                api,
                modules: BTreeMap::new(),
            }),
            tree: ArcSwap::from_pointee(RouteTree::new()),
            fallback: Arc::new(default_handler),
        };
        registry.rebuild(&registry.lock());
        registry
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the declared operations.
    pub fn declare(&self, api: Arc<ApiDescription>) {
        let mut state = self.lock();
        state.api = api;
        self.rebuild(&state);
    }

    /// Install or replace the module for `route`. An empty module removes it.
    pub fn swap(&self, route: RoutePath, module: HandlerModule) {
        let mut state = self.lock();
        let key = route.to_string();
        if module.is_empty() {
            state.modules.remove(&key);
        } else {
            state.modules.insert(key, (route, module));
        }
        self.rebuild(&state);
    }

    /// Drop the module for `route`. Declared operations stay routable.
    pub fn remove(&self, route: &RoutePath) -> bool {
        let mut state = self.lock();
        let removed = state.modules.remove(&route.to_string()).is_some();
        if removed {
            self.rebuild(&state);
        }
        removed
    }

    /// The route tree requests should use.
    pub fn snapshot(&self) -> Arc<RouteTree<RouteHandler>> {
        self.tree.load_full()
    }

    pub fn api(&self) -> Arc<ApiDescription> {
        self.lock().api.clone()
    }

    /// Every routable template with its methods.
    pub fn routes(&self) -> Vec<(RoutePath, Vec<Method>)> {
        self.tree.load().routes()
    }

    fn rebuild(&self, state: &RegistryState) {
        let mut tree = RouteTree::new();

        for (route, module) in state.modules.values() {
            for method in module.methods() {
                let Some(handler) = module.get(&method) else { continue };
                let operation = state.api.operation(&method, &route.to_string());
                insert(&mut tree, method, route, RouteHandler { handler, operation });
            }
        }

        for entry in state.api.operations() {
            let covered = state
                .modules
                .get(&entry.path.to_string())
                .map(|(_, module)| module.get(&entry.operation.method).is_some())
                .unwrap_or(false);
            if !covered {
                let handler = RouteHandler {
                    handler: self.fallback.clone(),
                    operation: Some(entry.operation.clone()),
                };
                insert(&mut tree, entry.operation.method.clone(), &entry.path, handler);
            }
        }

        tracing::debug!(routes = tree.len(), "Route tree rebuilt");
        self.tree.store(Arc::new(tree));
    }
}

fn insert(tree: &mut RouteTree<RouteHandler>, method: Method, route: &RoutePath, handler: RouteHandler) {
    if let Err(e) = tree.insert(method, route, handler) {
        tracing::warn!(error = %e, "Skipping route");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::operation::{Operation, ResponseSpec};
    use crate::api::schema::Components;
    use crate::modules::handler::HandlerRequest;
    use crate::response::MockResponse;
    use crate::routing::router::RouteMatch;

    fn route(template: &str) -> RoutePath {
        RoutePath::parse(template).unwrap()
    }

    fn api() -> Arc<ApiDescription> {
        Arc::new(ApiDescription::from_operations(
            vec![(
                route("/pets"),
                Operation::new(Method::GET).with_response("200", ResponseSpec::new()),
            )],
            Components::default(),
        ))
    }

    async fn teapot(_request: HandlerRequest) -> crate::modules::handler::HandlerResult {
        Ok(MockResponse::new(418))
    }

    #[test]
    fn test_declared_operations_are_routable() {
        let registry = ModuleRegistry::new(api());
        match registry.snapshot().lookup(&Method::GET, "/pets") {
            RouteMatch::Found { handler, .. } => assert!(handler.operation.is_some()),
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn test_swap_publishes_new_snapshot() {
        let registry = ModuleRegistry::new(api());
        let before = registry.snapshot();

        registry.swap(route("/owners/{id}"), HandlerModule::new().with(Method::GET, teapot));

        assert!(matches!(
            before.lookup(&Method::GET, "/owners/1"),
            RouteMatch::NotFound
        ));
        assert!(matches!(
            registry.snapshot().lookup(&Method::GET, "/owners/1"),
            RouteMatch::Found { .. }
        ));
        assert_eq!(registry.routes().len(), 2);

        assert!(registry.remove(&route("/owners/{id}")));
        assert!(!registry.remove(&route("/owners/{id}")));
        assert!(matches!(
            registry.snapshot().lookup(&Method::GET, "/owners/1"),
            RouteMatch::NotFound
        ));
    }

    #[test]
    fn test_module_overrides_declared_operation() {
        let registry = ModuleRegistry::new(api());
        registry.swap(
            route("/pets"),
            HandlerModule::new().with(Method::GET, teapot).with(Method::POST, teapot),
        );

        let tree = registry.snapshot();
        assert_eq!(tree.len(), 2);
        match tree.lookup(&Method::GET, "/pets") {
            RouteMatch::Found { handler, .. } => {
                assert!(handler.operation.is_some());
                assert!(!Arc::ptr_eq(&handler.handler, &registry.fallback));
            }
            other => panic!("expected a match, got {:?}", other),
        }

        registry.remove(&route("/pets"));
        assert_eq!(registry.snapshot().len(), 1);
    }
}
