use std::any::Any;
use std::collections::HashMap;

use crate::model::Value;

/// Read access to the values parsed so far.
pub trait ResultView {
    /// The value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<&Value>;

    /// Whether a value is stored under `key`.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The stored keys, in insertion order.
    fn keys(&self) -> Vec<&str>;
}

impl<'a> dyn ResultView + 'a {
    /// The value stored under `key`, if any and if it is a `T`.
    ///
    /// ### Example
    /// ```
    /// # use arbor_builder as arbor;
    /// use arbor::{ResultStore, ResultView, SimpleResultStore, Value};
    ///
    /// let mut store = SimpleResultStore::default();
    /// store.put("amount", Value::new(5u32));
    ///
    /// let view: &dyn ResultView = &store;
    /// assert_eq!(view.get_as::<u32>("amount"), Some(&5));
    /// assert_eq!(view.get_as::<String>("amount"), None);
    /// ```
    pub fn get_as<T: Any>(&self, key: &str) -> Option<&T> {
        self.get(key).and_then(|value| value.downcast_ref::<T>())
    }
}

/// Write access to the values parsed so far.
pub trait ResultStore: ResultView {
    /// Store `value` under `key`.
    /// Replacing an existing key keeps its original position.
    fn put(&mut self, key: &str, value: Value);

    /// This store, as read only.
    fn view(&self) -> &dyn ResultView;
}

/// The insertion ordered [`ResultStore`].
#[derive(Default)]
pub struct SimpleResultStore {
    indices: HashMap<String, usize>,
    entries: Vec<(String, Value)>,
}

impl std::fmt::Debug for SimpleResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(key, value)| (key, value)))
            .finish()
    }
}

impl SimpleResultStore {
    /// The number of stored values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        self.indices.clear();
        self.entries.clear();
    }

    fn drain(&mut self) -> Vec<(String, Value)> {
        self.indices.clear();
        std::mem::take(&mut self.entries)
    }
}

impl ResultView for SimpleResultStore {
    fn get(&self, key: &str) -> Option<&Value> {
        self.indices.get(key).map(|index| &self.entries[*index].1)
    }

    fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }
}

impl ResultStore for SimpleResultStore {
    fn put(&mut self, key: &str, value: Value) {
        match self.indices.get(key) {
            Some(index) => self.entries[*index].1 = value,
            None => {
                self.indices.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), value));
            }
        }
    }

    fn view(&self) -> &dyn ResultView {
        self
    }
}

/// A [`ResultStore`] which holds back its writes.
///
/// Writes go to a private buffer, which is either dropped ([`BufferedResultStore::clear_buffer`]) or merged into the wrapped store ([`BufferedResultStore::apply_buffer`]).
/// Reads check the buffer first.
pub struct BufferedResultStore<'s> {
    inner: &'s mut dyn ResultStore,
    buffer: SimpleResultStore,
}

impl<'s> std::fmt::Debug for BufferedResultStore<'s> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedResultStore")
            .field("inner", &self.inner.keys())
            .field("buffer", &self.buffer)
            .finish()
    }
}

impl<'s> BufferedResultStore<'s> {
    /// Wrap `inner` with an empty buffer.
    pub fn new(inner: &'s mut dyn ResultStore) -> Self {
        Self::with_buffer(inner, SimpleResultStore::default())
    }

    pub(crate) fn with_buffer(inner: &'s mut dyn ResultStore, buffer: SimpleResultStore) -> Self {
        Self { inner, buffer }
    }

    pub(crate) fn into_buffer(self) -> SimpleResultStore {
        self.buffer
    }

    /// The buffered writes.
    pub fn buffer(&self) -> &SimpleResultStore {
        &self.buffer
    }

    /// Drop the buffered writes.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Merge the buffered writes into the wrapped store (in the order they were made), then clear the buffer.
    pub fn apply_buffer(&mut self) {
        for (key, value) in self.buffer.drain() {
            self.inner.put(&key, value);
        }
    }
}

impl<'s> ResultView for BufferedResultStore<'s> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.buffer.get(key).or_else(|| self.inner.get(key))
    }

    fn keys(&self) -> Vec<&str> {
        let mut keys = self.inner.keys();

        for key in self.buffer.keys() {
            if !self.inner.has(key) {
                keys.push(key);
            }
        }

        keys
    }
}

impl<'s> ResultStore for BufferedResultStore<'s> {
    fn put(&mut self, key: &str, value: Value) {
        self.buffer.put(key, value);
    }

    fn view(&self) -> &dyn ResultView {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_u32(view: &dyn ResultView, key: &str) -> Option<u32> {
        view.get_as::<u32>(key).copied()
    }

    #[test]
    fn simple_store() {
        // Setup
        let mut store = SimpleResultStore::default();

        // Execute
        store.put("b", Value::new(2u32));
        store.put("a", Value::new(1u32));
        store.put("b", Value::new(3u32));

        // Verify
        assert_eq!(store.len(), 2);
        assert_eq!(store.keys(), vec!["b", "a"]);
        assert!(store.has("a"));
        assert!(!store.has("c"));
        assert_eq!(get_u32(&store, "b"), Some(3));
        assert_eq!(get_u32(&store, "c"), None);
        assert_eq!(format!("{store:?}"), "{\"b\": 3, \"a\": 1}");
    }

    #[test]
    fn buffered_store_clear() {
        // Setup
        let mut store = SimpleResultStore::default();
        store.put("x", Value::new(0u32));
        let mut buffered = BufferedResultStore::new(&mut store);

        // Execute
        buffered.put("a", Value::new(1u32));
        buffered.put("b", Value::new(2u32));
        assert_eq!(buffered.keys(), vec!["x", "a", "b"]);
        buffered.clear_buffer();

        // Verify
        assert!(buffered.buffer().is_empty());
        assert!(!buffered.has("a"));
        assert_eq!(store.keys(), vec!["x"]);
    }

    #[test]
    fn buffered_store_apply() {
        // Setup
        let mut store = SimpleResultStore::default();
        let mut buffered = BufferedResultStore::new(&mut store);

        // Execute
        buffered.put("a", Value::new(1u32));
        buffered.put("b", Value::new(2u32));
        buffered.apply_buffer();

        // Verify
        assert!(buffered.buffer().is_empty());
        assert_eq!(get_u32(&buffered, "a"), Some(1));
        assert_eq!(store.keys(), vec!["a", "b"]);
        assert_eq!(get_u32(&store, "b"), Some(2));
    }

    #[test]
    fn buffered_store_reads_buffer_first() {
        // Setup
        let mut store = SimpleResultStore::default();
        store.put("a", Value::new(1u32));
        let mut buffered = BufferedResultStore::new(&mut store);

        // Execute
        buffered.put("a", Value::new(7u32));

        // Verify
        assert_eq!(get_u32(&buffered, "a"), Some(7));
        assert_eq!(buffered.keys(), vec!["a"]);
        assert_eq!(get_u32(buffered.inner.view(), "a"), Some(1));

        buffered.apply_buffer();
        assert_eq!(get_u32(&store, "a"), Some(7));
    }

    #[test]
    fn buffered_store_carries_buffer() {
        // Setup
        let mut store = SimpleResultStore::default();
        let mut buffered = BufferedResultStore::new(&mut store);
        buffered.put("a", Value::new(1u32));
        let buffer = buffered.into_buffer();

        // Execute
        let mut buffered = BufferedResultStore::with_buffer(&mut store, buffer);
        buffered.put("b", Value::new(2u32));
        buffered.apply_buffer();

        // Verify
        assert_eq!(store.keys(), vec!["a", "b"]);
    }
}
