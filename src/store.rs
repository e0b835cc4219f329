//! An insertion-order-preserving key/value store.
//!
//! Resource files care about line order, so the generic hash map is paired
//! with an explicit key sequence instead of relying on map iteration order.

use std::collections::HashMap;

/// A mapping from key to value that iterates in first-insertion order.
///
/// Re-inserting an existing key updates its value in place without moving its
/// position; removing a key removes it from both the lookup table and the
/// order sequence. Lookups and removals of absent keys report `None` rather
/// than failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedMap {
    keys: Vec<String>,
    values: HashMap<String, String>,
}

impl OrderedMap {
    /// Creates a new, empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates a key, returning the previous value if any.
    ///
    /// A key seen for the first time goes to the end of the iteration order;
    /// an existing key keeps its position.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let previous = self.values.insert(key.clone(), value.into());
        if previous.is_none() {
            self.keys.push(key);
        }
        previous
    }

    /// Removes a key, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let previous = self.values.remove(key);
        if previous.is_some() {
            self.keys.retain(|k| k != key);
        }
        previous
    }

    /// Returns the value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns true if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys
            .iter()
            .filter_map(|k| self.values.get(k).map(|v| (k.as_str(), v.as_str())))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
