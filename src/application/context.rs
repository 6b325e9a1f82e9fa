//! Call parameters and the per-call context built from them

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::domain::entities::ResolvedObject;
use crate::domain::value_objects::{KeyPath, Operation};

/// Explicit call-site parameters: plain data plus already resolved objects.
#[derive(Debug, Clone, Default)]
pub struct Params {
    data: Map<String, Value>,
    objects: HashMap<String, ResolvedObject>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Pass an object; it is keyed by its own type.
    pub fn with_object(mut self, object: ResolvedObject) -> Self {
        self.objects.insert(object.object_type().to_string(), object);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn objects(&self) -> &HashMap<String, ResolvedObject> {
        &self.objects
    }

    pub fn object(&self, object_type: &str) -> Option<&ResolvedObject> {
        self.objects.get(object_type)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.objects.is_empty()
    }
}

impl From<Map<String, Value>> for Params {
    fn from(data: Map<String, Value>) -> Self {
        Self {
            data,
            objects: HashMap::new(),
        }
    }
}

/// Non-object JSON values produce empty parameters.
impl From<Value> for Params {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => map.into(),
            _ => Self::default(),
        }
    }
}

impl From<ResolvedObject> for Params {
    fn from(object: ResolvedObject) -> Self {
        Self::new().with_object(object)
    }
}

/// Everything a handler or controller primitive gets to see for one call.
///
/// Lookup precedence, highest first: explicit parameters, dependency
/// objects (by type name), configuration values, declared defaults.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub(crate) object_type: String,
    pub(crate) operation: Operation,
    pub(crate) params: Params,
    pub(crate) objects: HashMap<String, ResolvedObject>,
    pub(crate) data: Map<String, Value>,
    pub(crate) hdata: Map<String, Value>,
    pub(crate) target: Option<ResolvedObject>,
    pub(crate) filter: Map<String, Value>,
    pub(crate) id: Option<String>,
}

impl CallContext {
    pub(crate) fn new(object_type: &str, operation: Operation, params: Params) -> Self {
        Self {
            object_type: object_type.to_string(),
            operation,
            params,
            objects: HashMap::new(),
            data: Map::new(),
            hdata: Map::new(),
            target: None,
            filter: Map::new(),
            id: None,
        }
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Resolve a key path against the context.
    ///
    /// `router/id` reads attribute `id` of the `router` dependency when no
    /// plain value named `router` exists.
    pub fn get(&self, key: &KeyPath) -> Option<Value> {
        let head = key.head();
        if let Some(value) = self.params.get(head) {
            return descend(value, key.tail());
        }
        if let Some(object) = self.objects.get(head) {
            if key.is_single() {
                return object.id().map(Value::String);
            }
            return object.get_path(key.tail());
        }
        self.data.get(head).and_then(|v| descend(v, key.tail()))
    }

    /// Shorthand for [`CallContext::get`] on a single-atom key.
    pub fn value(&self, name: &str) -> Option<Value> {
        let key = KeyPath::new([name]).ok()?;
        self.get(&key)
    }

    /// Flattened data view: values, then dependency ids, then parameters.
    pub fn values(&self) -> Map<String, Value> {
        let mut out = self.data.clone();
        for (object_type, object) in &self.objects {
            if let Some(id) = object.id() {
                out.insert(format!("{object_type}_id"), Value::String(id));
            }
        }
        for (key, value) in self.params.data() {
            out.insert(key.clone(), value.clone());
        }
        out
    }

    pub fn object(&self, object_type: &str) -> Option<&ResolvedObject> {
        self.objects.get(object_type)
    }

    pub fn objects(&self) -> &HashMap<String, ResolvedObject> {
        &self.objects
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Backend payload, in backend attribute names.
    pub fn hdata(&self) -> &Map<String, Value> {
        &self.hdata
    }

    /// Object being updated or deleted.
    pub fn target(&self) -> Option<&ResolvedObject> {
        self.target.as_ref()
    }

    /// Process-side query filter.
    pub fn filter(&self) -> &Map<String, Value> {
        &self.filter
    }

    /// Identifier requested by `get`.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

fn descend(value: &Value, path: &[String]) -> Option<Value> {
    let mut node = value;
    for atom in path {
        node = node.as_object()?.get(atom)?;
    }
    Some(node.clone())
}
