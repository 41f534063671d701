//! Prefix-scoped context lookup.

use dashmap::DashMap;

use crate::context::store::Context;
use crate::routing::path::{ancestors, normalize_prefix};

/// Contexts keyed by normalized path prefix.
///
/// The root (`""`) is always registered. `find` returns the context of the
/// longest registered prefix that is an ancestor of, or equal to, the path.
#[derive(Debug)]
pub struct ContextRegistry<C = Context> {
    entries: DashMap<String, C>,
}

impl<C: Clone + Default> Default for ContextRegistry<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: Clone> ContextRegistry<C> {
    pub fn new(root: C) -> Self {
        let entries = DashMap::new();
        entries.insert(String::new(), root);
        Self { entries }
    }

    /// Register or replace the context for `prefix`.
    pub fn register(&self, prefix: &str, context: C) -> Option<C> {
        self.entries.insert(normalize_prefix(prefix), context)
    }

    pub fn find(&self, path: &str) -> C {
        ancestors(path)
            .find_map(|prefix| self.entries.get(&prefix).map(|c| c.value().clone()))
            .unwrap_or_else(|| self.root())
    }

    /// The context registered exactly at `prefix`.
    pub fn get(&self, prefix: &str) -> Option<C> {
        self.entries
            .get(&normalize_prefix(prefix))
            .map(|c| c.value().clone())
    }

    /// Drop the context at `prefix`. The root cannot be removed.
    pub fn remove(&self, prefix: &str) -> Option<C> {
        let prefix = normalize_prefix(prefix);
        if prefix.is_empty() {
            return None;
        }
        self.entries.remove(&prefix).map(|(_, c)| c)
    }

    pub fn root(&self) -> C {
        // Guarded by `new` and `remove`; the root entry always exists.
        self.entries
            .get("")
            .map(|c| c.value().clone())
            .unwrap_or_else(|| unreachable!("root context removed"))
    }

    /// Registered prefixes, sorted.
    pub fn prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        prefixes.sort();
        prefixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_uses_longest_ancestor() {
        let registry: ContextRegistry<&str> = ContextRegistry::new("root");
        registry.register("/a/b", "ab");
        registry.register("/a", "a");

        assert_eq!(registry.find("/a/b/c"), "ab");
        assert_eq!(registry.find("/a/b"), "ab");
        assert_eq!(registry.find("/a/bc"), "a");
        assert_eq!(registry.find("/x"), "root");
        assert_eq!(registry.find("/"), "root");
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let registry: ContextRegistry<u8> = ContextRegistry::new(0);
        registry.register("/pets/", 1);

        assert_eq!(registry.prefixes(), vec!["".to_string(), "/pets".to_string()]);
        assert_eq!(registry.remove("/"), None);
        assert_eq!(registry.remove("/pets"), Some(1));
        assert_eq!(registry.find("/pets/1"), 0);
    }

    #[test]
    fn test_contexts_are_shared_by_reference() {
        let registry = ContextRegistry::new(Context::new());
        registry.register("/pets", Context::from_value(json!({ "pets": [] })));

        registry.find("/pets/{id}").set("last", json!(7));
        assert_eq!(registry.find("/pets").get("last"), Some(json!(7)));
        assert_eq!(registry.root().get("last"), None);
    }
}
