//! Layer stack
//!
//! Ordered config layers queried with deterministic precedence
//! (index 0 = highest priority):
//!
//! - `get`/`exist` stop at the first layer holding the key
//! - `where_is` collects every layer holding the key
//! - `set`/`del` touch exactly one layer (index 0 unless selected)
//! - `load`/`save` touch exactly one layer
//!
//! Rejected writes return `None`/`false`; they are never errors.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::domain::entities::{ConfigLayer, Tree};
use crate::domain::ports::{LayerFileError, LayerRepository};
use crate::domain::services::options_policy::{OptionsPolicy, PlainPolicy};
use crate::domain::services::template::{NoExpansion, TemplateExpander};
use crate::domain::value_objects::{Access, IntoKeyPath, KeyPath};
use crate::error::{TesseraError, TesseraResult};
use crate::infrastructure::repositories::YamlLayerRepository;

/// Stack shared across the dispatcher and process handlers.
///
/// Writes (`set`/`del`/`load`/`save`) take the write lock; reads may run
/// concurrently with each other.
pub type SharedConfig = Arc<RwLock<LayerStack>>;

/// Which layer a targeted call applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSelector {
    /// Highest-priority layer (index 0)
    Top,
    Name(String),
    Index(usize),
}

impl fmt::Display for LayerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerSelector::Top => write!(f, "#0"),
            LayerSelector::Name(name) => write!(f, "{}", name),
            LayerSelector::Index(index) => write!(f, "#{}", index),
        }
    }
}

impl From<&str> for LayerSelector {
    fn from(name: &str) -> Self {
        LayerSelector::Name(name.to_string())
    }
}

impl From<String> for LayerSelector {
    fn from(name: String) -> Self {
        LayerSelector::Name(name)
    }
}

impl From<usize> for LayerSelector {
    fn from(index: usize) -> Self {
        LayerSelector::Index(index)
    }
}

pub struct LayerStack {
    layers: Vec<ConfigLayer>,
    policy: Arc<dyn OptionsPolicy>,
    expander: Arc<dyn TemplateExpander>,
    repository: Arc<dyn LayerRepository>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            policy: Arc::new(PlainPolicy),
            expander: Arc::new(NoExpansion),
            repository: Arc::new(YamlLayerRepository::new()),
        }
    }

    /// Build from layers listed highest priority first.
    pub fn from_layers(layers: Vec<ConfigLayer>) -> TesseraResult<Self> {
        let mut stack = Self::new();
        for layer in layers {
            stack.push_layer(layer)?;
        }
        Ok(stack)
    }

    pub fn with_policy(mut self, policy: Arc<dyn OptionsPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_policy(&mut self, policy: Arc<dyn OptionsPolicy>) {
        self.policy = policy;
    }

    pub fn with_expander(mut self, expander: Arc<dyn TemplateExpander>) -> Self {
        self.expander = expander;
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn LayerRepository>) -> Self {
        self.repository = repository;
        self
    }

    pub fn into_shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }

    // ---- layer management ----

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// Append as the new lowest-priority layer.
    pub fn push_layer(&mut self, layer: ConfigLayer) -> TesseraResult<()> {
        let index = self.layers.len();
        self.insert_layer(index, layer)
    }

    /// Insert at `index` (clamped to the stack length).
    pub fn insert_layer(&mut self, index: usize, layer: ConfigLayer) -> TesseraResult<()> {
        if self.layers.iter().any(|l| l.name == layer.name) {
            return Err(TesseraError::DuplicateLayer { name: layer.name });
        }
        let index = index.min(self.layers.len());
        debug!(layer = %layer.name, index, "config layer added");
        self.layers.insert(index, layer);
        Ok(())
    }

    pub fn remove_layer(&mut self, selector: impl Into<LayerSelector>) -> TesseraResult<ConfigLayer> {
        let index = self.index_of(&selector.into())?;
        let layer = self.layers.remove(index);
        debug!(layer = %layer.name, "config layer removed");
        Ok(layer)
    }

    pub fn index_of(&self, selector: &LayerSelector) -> TesseraResult<usize> {
        let found = match selector {
            LayerSelector::Top => (!self.layers.is_empty()).then_some(0),
            LayerSelector::Name(name) => self.layers.iter().position(|l| &l.name == name),
            LayerSelector::Index(index) => (*index < self.layers.len()).then_some(*index),
        };
        found.ok_or_else(|| TesseraError::UnknownLayer {
            selector: selector.to_string(),
        })
    }

    pub fn layer(&self, selector: impl Into<LayerSelector>) -> TesseraResult<&ConfigLayer> {
        let index = self.index_of(&selector.into())?;
        Ok(&self.layers[index])
    }

    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    /// Replace a layer's values wholesale, bypassing `can_write`.
    ///
    /// Reserved for derived layers the crate maintains itself.
    pub(crate) fn replace_values(
        &mut self,
        selector: impl Into<LayerSelector>,
        values: Tree,
    ) -> TesseraResult<()> {
        let index = self.index_of(&selector.into())?;
        self.layers[index].store.replace(values);
        Ok(())
    }

    /// Point a layer at a new file. `false` when the filename is fixed.
    pub fn set_filename(
        &mut self,
        selector: impl Into<LayerSelector>,
        path: impl Into<PathBuf>,
    ) -> TesseraResult<bool> {
        let index = self.index_of(&selector.into())?;
        let layer = &mut self.layers[index];
        if !layer.filename_mutable && layer.filename.is_some() {
            debug!(layer = %layer.name, "filename change rejected");
            return Ok(false);
        }
        layer.filename = Some(path.into());
        Ok(true)
    }

    // ---- reads ----

    /// First value found scanning from the highest-priority layer.
    pub fn get(&self, key: impl IntoKeyPath) -> TesseraResult<Option<Value>> {
        let key = key.into_key_path()?;
        Ok(self.lookup(&key, true))
    }

    pub fn get_or(&self, key: impl IntoKeyPath, default: impl Into<Value>) -> TesseraResult<Value> {
        Ok(self.get(key)?.unwrap_or_else(|| default.into()))
    }

    /// Value of `key` in one layer only.
    pub fn get_in(
        &self,
        selector: impl Into<LayerSelector>,
        key: impl IntoKeyPath,
    ) -> TesseraResult<Option<Value>> {
        let key = key.into_key_path()?;
        let index = self.index_of(&selector.into())?;
        let layer = &self.layers[index];
        let options = self.policy.options_for(index, layer, Some(&key), Access::Read);
        Ok(layer.store.get(&key, &options).cloned())
    }

    pub fn exist(&self, key: impl IntoKeyPath) -> TesseraResult<bool> {
        let key = key.into_key_path()?;
        Ok(self.first_index(&key).is_some())
    }

    /// Names of every layer holding `key`, highest priority first.
    pub fn where_is(&self, key: impl IntoKeyPath) -> TesseraResult<Vec<String>> {
        let key = key.into_key_path()?;
        Ok(self
            .layers
            .iter()
            .enumerate()
            .filter(|(index, layer)| {
                let options = self.policy.options_for(*index, layer, Some(&key), Access::Read);
                layer.store.exist(&key, &options)
            })
            .map(|(_, layer)| layer.name.clone())
            .collect())
    }

    fn first_index(&self, key: &KeyPath) -> Option<usize> {
        self.layers.iter().enumerate().find_map(|(index, layer)| {
            let options = self.policy.options_for(index, layer, Some(key), Access::Read);
            layer.store.exist(key, &options).then_some(index)
        })
    }

    fn lookup(&self, key: &KeyPath, expand: bool) -> Option<Value> {
        let index = self.first_index(key)?;
        let layer = &self.layers[index];
        let options = self.policy.options_for(index, layer, Some(key), Access::Read);
        let value = layer.store.get(key, &options)?.clone();

        match value {
            Value::String(text) if expand && layer.expand_templates => {
                let lookup = |k: &KeyPath| self.lookup(k, false);
                Some(Value::String(self.expander.expand(&text, &lookup)))
            }
            other => Some(other),
        }
    }

    /// Deep merge of every layer, lowest priority first.
    pub fn merged(&self) -> Tree {
        let mut out = Tree::new();
        for layer in self.layers.iter().rev() {
            out.merge(layer.values());
        }
        out
    }

    // ---- writes ----

    /// Write to the highest-priority layer.
    pub fn set(&mut self, key: impl IntoKeyPath, value: impl Into<Value>) -> TesseraResult<Option<Value>> {
        self.set_in(LayerSelector::Top, key, value)
    }

    /// Write to one layer. `None` when the layer or the key is readonly.
    pub fn set_in(
        &mut self,
        selector: impl Into<LayerSelector>,
        key: impl IntoKeyPath,
        value: impl Into<Value>,
    ) -> TesseraResult<Option<Value>> {
        let key = key.into_key_path()?;
        let index = self.index_of(&selector.into())?;
        let options = self
            .policy
            .options_for(index, &self.layers[index], Some(&key), Access::Write);
        let layer = &mut self.layers[index];
        if !layer.can_write {
            debug!(layer = %layer.name, key = %key, "set rejected: layer is readonly");
            return Ok(None);
        }
        let stored = layer.store.set(&key, value.into(), &options);
        if stored.is_none() {
            debug!(layer = %layer.name, key = %key, "set rejected: key is readonly");
        }
        Ok(stored)
    }

    pub fn del(&mut self, key: impl IntoKeyPath) -> TesseraResult<Option<Value>> {
        self.del_in(LayerSelector::Top, key)
    }

    /// Remove `key` from one layer only; lower layers keep their copy.
    pub fn del_in(
        &mut self,
        selector: impl Into<LayerSelector>,
        key: impl IntoKeyPath,
    ) -> TesseraResult<Option<Value>> {
        let key = key.into_key_path()?;
        let index = self.index_of(&selector.into())?;
        let options = self
            .policy
            .options_for(index, &self.layers[index], Some(&key), Access::Write);
        let layer = &mut self.layers[index];
        if !layer.can_write {
            debug!(layer = %layer.name, key = %key, "del rejected: layer is readonly");
            return Ok(None);
        }
        Ok(layer.store.del(&key, &options))
    }

    /// Empty one layer. `false` when the layer is readonly.
    pub fn clear(&mut self, selector: impl Into<LayerSelector>) -> TesseraResult<bool> {
        let index = self.index_of(&selector.into())?;
        let layer = &mut self.layers[index];
        if !layer.can_write {
            return Ok(false);
        }
        layer.store.clear();
        Ok(true)
    }

    // ---- persistence ----

    /// Replace a layer's values with its file content.
    pub fn load(&mut self, selector: impl Into<LayerSelector>) -> TesseraResult<bool> {
        let index = self.index_of(&selector.into())?;
        let layer = &self.layers[index];
        if !layer.can_load {
            debug!(layer = %layer.name, "load rejected: layer is not loadable");
            return Ok(false);
        }
        let path = layer
            .filename
            .clone()
            .ok_or_else(|| LayerFileError::NoFilename {
                layer: layer.name.clone(),
            })?;

        let tree = self.repository.read(&path)?;
        let layer = &mut self.layers[index];
        layer.store.replace(tree);
        debug!(layer = %layer.name, path = %path.display(), "config layer loaded");
        Ok(true)
    }

    /// Write a layer's values to its file.
    pub fn save(&mut self, selector: impl Into<LayerSelector>) -> TesseraResult<bool> {
        let index = self.index_of(&selector.into())?;
        let layer = &self.layers[index];
        let options = self.policy.options_for(index, layer, None, Access::Save);
        if !layer.can_save || options.file_readonly {
            debug!(layer = %layer.name, "save rejected: layer is not savable");
            return Ok(false);
        }
        let path = layer
            .filename
            .clone()
            .ok_or_else(|| LayerFileError::NoFilename {
                layer: layer.name.clone(),
            })?;

        self.repository.write(&path, layer.values())?;
        debug!(layer = %layer.name, path = %path.display(), "config layer saved");
        Ok(true)
    }
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerStack")
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}
