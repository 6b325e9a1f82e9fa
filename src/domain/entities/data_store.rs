//! Data store entity
//!
//! A single hierarchical container. A flat store keeps keys at the top level;
//! a sectioned store nests every key under a section name.

use serde_json::Value;

use crate::domain::entities::Tree;
use crate::domain::value_objects::{KeyPath, StoreOptions};

pub const DEFAULT_SECTION: &str = "default";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataStore {
    values: Tree,
    sectioned: bool,
}

impl DataStore {
    pub fn flat() -> Self {
        Self {
            values: Tree::new(),
            sectioned: false,
        }
    }

    pub fn sectioned() -> Self {
        Self {
            values: Tree::new(),
            sectioned: true,
        }
    }

    pub fn with_values(mut self, values: Tree) -> Self {
        self.values = values;
        self
    }

    pub fn is_sectioned(&self) -> bool {
        self.sectioned
    }

    pub fn values(&self) -> &Tree {
        &self.values
    }

    pub fn replace(&mut self, values: Tree) {
        self.values = values;
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Section applied to `key` under `options` (None for flat stores).
    ///
    /// Forced option wins over the key's own section; `default` otherwise.
    pub fn section_for<'a>(&self, key: &'a KeyPath, options: &'a StoreOptions) -> Option<&'a str> {
        if !self.sectioned {
            return None;
        }
        Some(
            options
                .section
                .as_deref()
                .or(key.section())
                .unwrap_or(DEFAULT_SECTION),
        )
    }

    fn path(&self, key: &KeyPath, options: &StoreOptions) -> Vec<String> {
        key.resolved_with(self.section_for(key, options))
    }

    pub fn get(&self, key: &KeyPath, options: &StoreOptions) -> Option<&Value> {
        self.values.get(&self.path(key, options))
    }

    pub fn exist(&self, key: &KeyPath, options: &StoreOptions) -> bool {
        self.values.exist(&self.path(key, options))
    }

    /// Returns the stored value, or `None` when `data_readonly` is in force.
    pub fn set(&mut self, key: &KeyPath, value: Value, options: &StoreOptions) -> Option<Value> {
        if options.data_readonly {
            return None;
        }
        let path = self.path(key, options);
        self.values.set(&path, value.clone());
        Some(value)
    }

    /// Returns the removed value; `None` when absent or readonly.
    pub fn del(&mut self, key: &KeyPath, options: &StoreOptions) -> Option<Value> {
        if options.data_readonly {
            return None;
        }
        let path = self.path(key, options);
        self.values.del(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(s: &str) -> KeyPath {
        KeyPath::parse(s).unwrap()
    }

    #[test]
    fn flat_store_ignores_sections() {
        let mut store = DataStore::flat();
        let opts = StoreOptions::new().with_section("account");
        store.set(&key("course"), json!("Art"), &opts);
        assert_eq!(store.values().as_map().get("course"), Some(&json!("Art")));
        assert_eq!(store.get(&key("other#course"), &StoreOptions::new()), Some(&json!("Art")));
    }

    #[test]
    fn sectioned_store_defaults_to_default_section() {
        let mut store = DataStore::sectioned();
        store.set(&key("course"), json!("Art"), &StoreOptions::new());
        assert_eq!(
            store.get(&key("default#course"), &StoreOptions::new()),
            Some(&json!("Art"))
        );
    }

    #[test]
    fn forced_section_wins_over_key_section() {
        let mut store = DataStore::sectioned();
        let opts = StoreOptions::new().with_section("student");
        store.set(&key("account#course"), json!("Art"), &opts);
        assert!(store.exist(&key("student#course"), &StoreOptions::new()));
        assert!(!store.exist(&key("account#course"), &StoreOptions::new()));
    }

    #[test]
    fn readonly_rejects_set_and_del() {
        let mut store = DataStore::flat();
        store.set(&key("a"), json!(1), &StoreOptions::new());
        let ro = StoreOptions::new().data_readonly(true);
        assert_eq!(store.set(&key("a"), json!(2), &ro), None);
        assert_eq!(store.del(&key("a"), &ro), None);
        assert_eq!(store.get(&key("a"), &StoreOptions::new()), Some(&json!(1)));
    }
}
