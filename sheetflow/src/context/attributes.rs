//! Open key/value metadata carried by a context.

use crate::errors::AttributeConflictError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cross-cutting metadata with unique keys.
///
/// Writing to an existing key raises an `AttributeConflictError`. The bag is
/// owned by a single run, so it needs no lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag {
    data: HashMap<String, serde_json::Value>,
}

impl AttributeBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Sets a value.
    ///
    /// # Errors
    ///
    /// Returns `AttributeConflictError` if the key already exists.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) -> Result<(), AttributeConflictError> {
        let key = key.into();
        if self.data.contains_key(&key) {
            return Err(AttributeConflictError::new(key));
        }
        self.data.insert(key, value);
        Ok(())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let mut bag = AttributeBag::new();
        bag.set("source", json!("upload")).unwrap();

        assert_eq!(bag.get("source"), Some(&json!("upload")));
        assert!(bag.contains_key("source"));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut bag = AttributeBag::new();
        bag.set("k", json!(1)).unwrap();

        let err = bag.set("k", json!(2)).unwrap_err();
        assert_eq!(err, AttributeConflictError::new("k"));
        assert_eq!(bag.get("k"), Some(&json!(1)));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut bag = AttributeBag::new();
        bag.set("grade", json!(3)).unwrap();

        assert_eq!(serde_json::to_value(&bag).unwrap(), json!({"grade": 3}));
    }
}
