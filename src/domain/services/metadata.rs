//! Metadata model
//!
//! A three-layer stack describing every declared attribute:
//!
//! | layer        | content                                        |
//! |--------------|------------------------------------------------|
//! | `controller` | controller overrides and attribute mappings    |
//! | `map`        | derived `keys.<key> -> [sections]` relation    |
//! | `app`        | application schema, fixed at load time         |
//!
//! Tree layout of `app`/`controller`:
//!
//! ```text
//! sections.<section>.<key>    -> AttributeMeta
//! objects.<type>.mapping.<a>  -> AttrMapping
//! objects.<type>.undefined    -> [attr, ...]
//! objects.<type>.hdata        -> [HdataEntry, ...]
//! ```
//!
//! `map` is never written by callers; it is rebuilt in full whenever `app`
//! or `controller` changes.

use std::sync::{Arc, RwLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::entities::{AttrMapping, ConfigLayer, Tree, TypeMapping};
use crate::domain::services::layer_stack::LayerStack;
use crate::domain::value_objects::{IntoKeyPath, KeyPath};
use crate::error::{TesseraError, TesseraResult};

pub type SharedMetadata = Arc<RwLock<MetadataModel>>;

pub const CONTROLLER_LAYER: &str = "controller";
pub const MAP_LAYER: &str = "map";
pub const APP_LAYER: &str = "app";

const SECTIONS: &str = "sections";
const KEYS: &str = "keys";
const OBJECTS: &str = "objects";

/// Hints used by interactive setup tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetupHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_step: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_sort: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

impl SetupHints {
    pub fn is_empty(&self) -> bool {
        *self == SetupHints::default()
    }
}

/// Declared properties of one attribute in one section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeMeta {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub account_exclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Regular expression the value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<String>,
    #[serde(default, skip_serializing_if = "SetupHints::is_empty")]
    pub setup: SetupHints,
}

impl AttributeMeta {
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn account_exclusive(mut self) -> Self {
        self.account_exclusive = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_validation(mut self, pattern: impl Into<String>) -> Self {
        self.validate = Some(pattern.into());
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.setup.desc = Some(desc.into());
        self
    }

    pub fn with_setup(mut self, setup: SetupHints) -> Self {
        self.setup = setup;
        self
    }
}

/// One backend payload entry: context value at `source` lands at `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HdataEntry {
    pub source: Vec<String>,
    pub target: Vec<String>,
}

#[derive(Debug)]
pub struct MetadataModel {
    stack: LayerStack,
}

impl MetadataModel {
    pub fn new(app: Tree) -> Self {
        let layers = vec![
            ConfigLayer::new(CONTROLLER_LAYER).writable(),
            ConfigLayer::new(MAP_LAYER),
            ConfigLayer::new(APP_LAYER).with_values(app),
        ];
        let mut stack = LayerStack::new();
        for layer in layers {
            // names are distinct constants
            let _ = stack.push_layer(layer);
        }
        let mut model = Self { stack };
        model.build_section_mapping();
        model
    }

    pub fn into_shared(self) -> SharedMetadata {
        Arc::new(RwLock::new(self))
    }

    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    pub fn replace_app(&mut self, app: Tree) {
        let _ = self.stack.replace_values(APP_LAYER, app);
        self.build_section_mapping();
    }

    pub fn set_controller(&mut self, tree: Tree) {
        let _ = self.stack.replace_values(CONTROLLER_LAYER, tree);
        self.build_section_mapping();
    }

    /// Merge `tree` on top of the current controller layer.
    pub fn merge_controller(&mut self, tree: &Tree) {
        let mut current = self
            .stack
            .layer(CONTROLLER_LAYER)
            .map(|l| l.values().clone())
            .unwrap_or_default();
        current.merge(tree);
        self.set_controller(current);
    }

    pub fn controller_set(
        &mut self,
        key: impl IntoKeyPath,
        value: impl Into<Value>,
    ) -> TesseraResult<Option<Value>> {
        let stored = self.stack.set_in(CONTROLLER_LAYER, key, value)?;
        self.build_section_mapping();
        Ok(stored)
    }

    pub fn controller_del(&mut self, key: impl IntoKeyPath) -> TesseraResult<Option<Value>> {
        let removed = self.stack.del_in(CONTROLLER_LAYER, key)?;
        self.build_section_mapping();
        Ok(removed)
    }

    /// Regenerate the `map` layer from every (section, key) pair declared in
    /// `app` and `controller`.
    pub fn build_section_mapping(&mut self) {
        let mut keys: Map<String, Value> = Map::new();
        for (section, attrs) in self.merged_sections() {
            let Value::Object(attrs) = attrs else {
                continue;
            };
            for key in attrs.keys() {
                let entry = keys
                    .entry(key.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(list) = entry {
                    let section = Value::String(section.clone());
                    if !list.contains(&section) {
                        list.push(section);
                    }
                }
            }
        }

        let mut map = Tree::new();
        map.set(&[KEYS.to_string()], Value::Object(keys));
        let _ = self.stack.replace_values(MAP_LAYER, map);
        debug!("metadata section mapping rebuilt");
    }

    fn merged_sections(&self) -> Map<String, Value> {
        let mut merged = Tree::new();
        for name in [APP_LAYER, CONTROLLER_LAYER] {
            if let Ok(layer) = self.stack.layer(name) {
                merged.merge(layer.values());
            }
        }
        match merged.get(&[SECTIONS.to_string()]) {
            Some(Value::Object(sections)) => sections.clone(),
            _ => Map::new(),
        }
    }

    /// Raw metadata value, controller first.
    pub fn get(&self, key: impl IntoKeyPath) -> TesseraResult<Option<Value>> {
        self.stack.get(key)
    }

    /// Declared sections, in declaration order.
    pub fn sections(&self) -> Vec<String> {
        self.merged_sections().keys().cloned().collect()
    }

    pub fn keys_in(&self, section: &str) -> Vec<String> {
        match self.merged_sections().get(section) {
            Some(Value::Object(attrs)) => attrs.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Every section declaring `key`, first-declared first.
    pub fn sections_for(&self, key: &str) -> Vec<String> {
        let path = [KEYS.to_string(), key.to_string()];
        match self.stack.layer(MAP_LAYER).ok().and_then(|l| l.values().get(&path)) {
            Some(Value::Array(list)) => list
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn first_section(&self, key: &str) -> Option<String> {
        self.sections_for(key).into_iter().next()
    }

    /// Section a key path belongs to: explicit `section#` wins, else the
    /// first declared section.
    pub fn section_of(&self, key: &KeyPath) -> Option<String> {
        key.section()
            .map(str::to_string)
            .or_else(|| self.first_section(key.head()))
    }

    /// Attribute declaration, with controller fields overriding app fields.
    pub fn attribute(&self, section: &str, key: &str) -> Option<AttributeMeta> {
        let path = [SECTIONS.to_string(), section.to_string(), key.to_string()];
        let mut merged: Option<Map<String, Value>> = None;
        for name in [APP_LAYER, CONTROLLER_LAYER] {
            let Ok(layer) = self.stack.layer(name) else {
                continue;
            };
            if let Some(Value::Object(fields)) = layer.values().get(&path) {
                let mut tree = Tree::from_map(merged.take().unwrap_or_default());
                tree.merge(&Tree::from_map(fields.clone()));
                merged = Some(tree.as_map().clone());
            }
        }
        let fields = merged?;
        match serde_json::from_value(Value::Object(fields)) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(section, key, error = %e, "ignoring malformed attribute metadata");
                None
            }
        }
    }

    /// Declaration for a key path, with the section it resolved to.
    pub fn attribute_for(&self, key: &KeyPath) -> Option<(String, AttributeMeta)> {
        let section = self.section_of(key)?;
        let meta = self.attribute(&section, key.head())?;
        Some((section, meta))
    }

    pub fn is_readonly(&self, key: &KeyPath) -> bool {
        self.attribute_for(key).is_some_and(|(_, m)| m.readonly)
    }

    pub fn is_account_exclusive(&self, key: &KeyPath) -> bool {
        self.attribute_for(key)
            .is_some_and(|(_, m)| m.account_exclusive)
    }

    pub fn default_value(&self, key: &KeyPath) -> Option<Value> {
        self.attribute_for(key).and_then(|(_, m)| m.default_value)
    }

    pub fn setup_hints(&self, key: &KeyPath) -> Option<SetupHints> {
        self.attribute_for(key).map(|(_, m)| m.setup)
    }

    /// Check `value` against the key's validation rule (always true without one).
    pub fn validate(&self, key: &KeyPath, value: &Value) -> TesseraResult<bool> {
        let Some(pattern) = self.attribute_for(key).and_then(|(_, m)| m.validate) else {
            return Ok(true);
        };
        let regex = Regex::new(&pattern).map_err(|e| TesseraError::InvalidValidationRule {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(_) | Value::Bool(_) => value.to_string(),
            _ => return Ok(false),
        };
        Ok(regex.is_match(&text))
    }

    // ---- object mappings ----

    fn object_value(&self, object_type: &str, field: &str) -> Option<Value> {
        let key = KeyPath::new([OBJECTS, object_type, field]).ok()?;
        self.stack.get(&key).ok().flatten()
    }

    /// Mapping snapshot used to wrap objects of `object_type`.
    pub fn type_mapping(&self, object_type: &str) -> TypeMapping {
        let mut mapping = TypeMapping::new(object_type);
        if let Some(Value::Object(attrs)) = self.object_value(object_type, "mapping") {
            for (attr, raw) in attrs {
                match serde_json::from_value::<AttrMapping>(raw) {
                    Ok(m) => {
                        mapping.attrs.insert(attr, m);
                    }
                    Err(e) => {
                        warn!(object_type, attr = %attr, error = %e, "ignoring malformed attribute mapping")
                    }
                }
            }
        }
        if let Some(Value::Array(list)) = self.object_value(object_type, "undefined") {
            mapping.undefined = list
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
        }
        mapping
    }

    /// Backend payload entries the controller declared for `object_type`.
    pub fn hdata(&self, object_type: &str) -> Vec<HdataEntry> {
        match self.object_value(object_type, "hdata") {
            Some(raw) => serde_json::from_value(raw).unwrap_or_else(|e| {
                warn!(object_type, error = %e, "ignoring malformed hdata declaration");
                Vec::new()
            }),
            None => Vec::new(),
        }
    }
}

/// Path helpers shared with the schema builders.
pub(crate) fn section_path(section: &str, key: &str) -> Vec<String> {
    vec![SECTIONS.to_string(), section.to_string(), key.to_string()]
}

pub(crate) fn object_path(object_type: &str, field: &str) -> Vec<String> {
    vec![OBJECTS.to_string(), object_type.to_string(), field.to_string()]
}
