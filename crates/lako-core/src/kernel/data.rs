use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Extension bag carried by the application.
///
/// Values are stored type-erased under string keys; reads downcast back to
/// the concrete type and return `None` on a type mismatch.
#[derive(Default)]
pub struct AppData {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl AppData {
    pub fn new() -> Self {
        Self { values: HashMap::new() }
    }

    /// Store a value, replacing any previous value under the same key
    pub fn set<T: Any + Send + Sync>(&mut self, key: &str, value: T) {
        self.values.insert(key.to_string(), Box::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key).and_then(|value| value.downcast_mut::<T>())
    }

    /// Remove a value; returns it only if it has the requested type
    pub fn remove<T: Any + Send + Sync>(&mut self, key: &str) -> Option<T> {
        let value = self.values.remove(key)?;
        value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for AppData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppData")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}
