//! The shared JSON object handed to handlers as `context`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

/// Mutable state shared by every route in one directory subtree.
///
/// Cloning shares the same underlying object. The lock is only ever held
/// inside these methods, so a handler cannot keep it across an `.await`;
/// the flip side is that a read-modify-write spanning an `.await` is not
/// atomic with respect to other requests. Use [`Context::update`] for
/// changes that must be applied as one step.
#[derive(Debug, Clone, Default)]
pub struct Context {
    inner: Arc<Mutex<Map<String, Value>>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object; other values are stored under `"value"`.
    pub fn from_value(value: Value) -> Self {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self {
            inner: Arc::new(Mutex::new(map)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Store `value`, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.lock().insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    /// Apply `f` to the whole object under one lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        f(&mut self.lock())
    }

    /// A point-in-time copy of the object.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.lock().clone())
    }

    /// Whether both handles point at the same object.
    pub fn same_as(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
