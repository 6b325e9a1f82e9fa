//! Config layer entity
//!
//! A named data store plus what the stack is allowed to do with it.

use std::path::{Path, PathBuf};

use crate::domain::entities::{DataStore, Tree};

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    pub name: String,
    pub store: DataStore,
    pub can_write: bool,
    pub can_load: bool,
    pub can_save: bool,
    pub filename_mutable: bool,
    pub filename: Option<PathBuf>,
    /// Expand `{{ key }}` references in string values read from this layer.
    pub expand_templates: bool,
    /// Refuse `save` regardless of `can_save` (e.g. a shared system file).
    pub file_readonly: bool,
}

impl ConfigLayer {
    /// A read-only, flat, memory-only layer. Enable capabilities with the builders.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: DataStore::flat(),
            can_write: false,
            can_load: false,
            can_save: false,
            filename_mutable: false,
            filename: None,
            expand_templates: false,
            file_readonly: false,
        }
    }

    pub fn writable(mut self) -> Self {
        self.can_write = true;
        self
    }

    pub fn loadable(mut self) -> Self {
        self.can_load = true;
        self
    }

    pub fn savable(mut self) -> Self {
        self.can_save = true;
        self
    }

    pub fn sectioned(mut self) -> Self {
        self.store = DataStore::sectioned().with_values(self.store.values().clone());
        self
    }

    pub fn with_filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.filename = Some(path.into());
        self
    }

    pub fn filename_mutable(mut self) -> Self {
        self.filename_mutable = true;
        self
    }

    pub fn expand_templates(mut self) -> Self {
        self.expand_templates = true;
        self
    }

    pub fn file_readonly(mut self) -> Self {
        self.file_readonly = true;
        self
    }

    pub fn with_values(mut self, values: Tree) -> Self {
        self.store.replace(values);
        self
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn values(&self) -> &Tree {
        self.store.values()
    }
}
