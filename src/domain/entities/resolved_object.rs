//! Resolved object entity
//!
//! Wraps a controller-native object and exposes it under process-side
//! attribute names. Translation goes through a per-type mapping snapshot
//! taken from the metadata model when the object was wrapped.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ports::Controller;
use crate::error::{TesseraError, TesseraResult};

/// Process attribute → backend path, with an optional value-equivalence table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrMapping {
    pub path: Vec<String>,
    /// `(process value, backend value)` pairs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<(Value, Value)>,
}

impl AttrMapping {
    pub fn to_path<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, process: impl Into<Value>, backend: impl Into<Value>) -> Self {
        self.values.push((process.into(), backend.into()));
        self
    }

    pub fn to_process(&self, backend: Value) -> Value {
        self.values
            .iter()
            .find(|(_, b)| *b == backend)
            .map(|(p, _)| p.clone())
            .unwrap_or(backend)
    }

    pub fn to_backend(&self, process: Value) -> Value {
        self.values
            .iter()
            .find(|(p, _)| *p == process)
            .map(|(_, b)| b.clone())
            .unwrap_or(process)
    }
}

/// Everything needed to translate attribute names for one object type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeMapping {
    pub object_type: String,
    pub attrs: HashMap<String, AttrMapping>,
    pub undefined: HashSet<String>,
}

impl TypeMapping {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            ..Self::default()
        }
    }

    pub fn is_undefined(&self, attr: &str) -> bool {
        self.undefined.contains(attr)
    }

    /// Backend path for a process attribute (verbatim when unmapped).
    pub fn backend_path(&self, attr: &str) -> Vec<String> {
        self.attrs
            .get(attr)
            .map(|m| m.path.clone())
            .unwrap_or_else(|| vec![attr.to_string()])
    }

    pub fn to_backend_value(&self, attr: &str, value: Value) -> Value {
        match self.attrs.get(attr) {
            Some(mapping) => mapping.to_backend(value),
            None => value,
        }
    }

    pub fn to_process_value(&self, attr: &str, value: Value) -> Value {
        match self.attrs.get(attr) {
            Some(mapping) => mapping.to_process(value),
            None => value,
        }
    }
}

#[derive(Clone)]
pub struct ResolvedObject {
    object_type: String,
    native: Arc<RwLock<Value>>,
    mapping: Arc<TypeMapping>,
    controller: Arc<dyn Controller>,
}

impl ResolvedObject {
    pub fn new(
        native: Value,
        mapping: Arc<TypeMapping>,
        controller: Arc<dyn Controller>,
    ) -> Self {
        Self {
            object_type: mapping.object_type.clone(),
            native: Arc::new(RwLock::new(native)),
            mapping,
            controller,
        }
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn mapping(&self) -> &TypeMapping {
        &self.mapping
    }

    /// Snapshot of the backend-native payload.
    pub fn native(&self) -> Value {
        self.native
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn replace_native(&self, native: Value) {
        *self.native.write().unwrap_or_else(PoisonError::into_inner) = native;
    }

    /// Both handles point at the same resolution.
    pub fn same_instance(&self, other: &ResolvedObject) -> bool {
        Arc::ptr_eq(&self.native, &other.native)
    }

    /// Mapped attribute value; `None` when undefined or absent.
    pub fn get(&self, attr: &str) -> Option<Value> {
        self.try_get(attr).ok()
    }

    /// Attribute followed by nested atoms inside its (process-side) value.
    pub fn get_path(&self, path: &[String]) -> Option<Value> {
        let (attr, rest) = path.split_first()?;
        let mut value = self.get(attr)?;
        for atom in rest {
            value = value.as_object()?.get(atom)?.clone();
        }
        Some(value)
    }

    pub fn try_get(&self, attr: &str) -> TesseraResult<Value> {
        if self.mapping.is_undefined(attr) {
            return Err(self.mapping_error(attr, "attribute is undefined for this type"));
        }
        let path = self.mapping.backend_path(attr);
        let native = self.native.read().unwrap_or_else(PoisonError::into_inner);
        let raw = self
            .controller
            .get_attr(&native, &path)
            .ok_or_else(|| self.mapping_error(attr, "not present in backend object"))?;
        Ok(self.mapping.to_process_value(attr, raw))
    }

    /// Write through the mapping into the native payload.
    pub fn set(&self, attr: &str, value: impl Into<Value>) -> TesseraResult<()> {
        if self.mapping.is_undefined(attr) {
            return Err(self.mapping_error(attr, "attribute is undefined for this type"));
        }
        let path = self.mapping.backend_path(attr);
        let backend_value = self.mapping.to_backend_value(attr, value.into());
        let mut native = self.native.write().unwrap_or_else(PoisonError::into_inner);
        self.controller
            .set_attr(&mut native, &path, backend_value)
            .map_err(|e| self.mapping_error(attr, &e.to_string()))
    }

    /// Identifier as a string, from the mapped `id` attribute.
    pub fn id(&self) -> Option<String> {
        match self.get("id")? {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Full process-side view of the object.
    ///
    /// Top-level backend keys appear under their process names; nested
    /// mappings are added on top. Undefined attributes are left out.
    pub fn attrs(&self) -> Map<String, Value> {
        let reverse: HashMap<&str, &str> = self
            .mapping
            .attrs
            .iter()
            .filter(|(_, m)| m.path.len() == 1)
            .map(|(attr, m)| (m.path[0].as_str(), attr.as_str()))
            .collect();

        let mut out = Map::new();
        let top_keys: Vec<String> = match &*self.native.read().unwrap_or_else(PoisonError::into_inner)
        {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        };
        for key in top_keys {
            let name = reverse.get(key.as_str()).copied().unwrap_or(key.as_str());
            if let Some(value) = self.get(name) {
                out.insert(name.to_string(), value);
            }
        }
        for attr in self.mapping.attrs.keys() {
            if out.contains_key(attr) {
                continue;
            }
            if let Some(value) = self.get(attr) {
                out.insert(attr.clone(), value);
            }
        }
        out
    }

    /// Every filter pair equals the mapped attribute value.
    pub fn matches(&self, filter: &Map<String, Value>) -> bool {
        filter
            .iter()
            .all(|(attr, expected)| self.get(attr).as_ref() == Some(expected))
    }

    fn mapping_error(&self, attr: &str, reason: &str) -> TesseraError {
        TesseraError::AttributeMapping {
            object_type: self.object_type.clone(),
            attribute: attr.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Debug for ResolvedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedObject")
            .field("object_type", &self.object_type)
            .field("native", &self.native())
            .finish()
    }
}
