//! In-memory controller
//!
//! Keeps native objects per type in memory and records every primitive call.
//! Used by tests and as a stand-in backend while wiring new object types.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tracing::trace;

use crate::domain::entities::Tree;
use crate::domain::ports::{Controller, ControllerError, ControllerResult};
use crate::domain::value_objects::Operation;

/// One recorded primitive call.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerCall {
    pub object_type: String,
    pub operation: Operation,
    pub payload: Map<String, Value>,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<String, Vec<Value>>,
    next_id: u64,
    calls: Vec<ControllerCall>,
    failures: HashMap<(String, Operation), Vec<ControllerError>>,
    unsupported: HashSet<(String, Operation)>,
}

/// Objects get string ids `"1"`, `"2"`, ... unless the payload carries one.
#[derive(Default)]
pub struct MockController {
    state: Mutex<State>,
}

impl MockController {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a native object as-is; an `id` is assigned when missing.
    pub fn seed(&self, object_type: &str, native: Value) -> Value {
        let mut state = self.state();
        let native = state.assign_id(native);
        state
            .objects
            .entry(object_type.to_string())
            .or_default()
            .push(native.clone());
        native
    }

    pub fn objects(&self, object_type: &str) -> Vec<Value> {
        self.state()
            .objects
            .get(object_type)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<ControllerCall> {
        self.state().calls.clone()
    }

    pub fn count(&self, operation: Operation, object_type: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.operation == operation && c.object_type == object_type)
            .count()
    }

    /// Queue an error for the next call of `operation` on `object_type`.
    pub fn fail_next(&self, object_type: &str, operation: Operation, error: ControllerError) {
        self.state()
            .failures
            .entry((object_type.to_string(), operation))
            .or_default()
            .push(error);
    }

    pub fn mark_unsupported(&self, object_type: &str, operation: Operation) {
        self.state()
            .unsupported
            .insert((object_type.to_string(), operation));
    }

    fn begin(
        &self,
        object_type: &str,
        operation: Operation,
        payload: &Map<String, Value>,
    ) -> ControllerResult<MutexGuard<'_, State>> {
        let mut state = self.state();
        trace!(object_type, operation = %operation, "mock controller call");
        state.calls.push(ControllerCall {
            object_type: object_type.to_string(),
            operation,
            payload: payload.clone(),
        });

        let key = (object_type.to_string(), operation);
        if state.unsupported.contains(&key) {
            return Err(ControllerError::unsupported(object_type, operation));
        }
        if let Some(queue) = state.failures.get_mut(&key) {
            if !queue.is_empty() {
                return Err(queue.remove(0));
            }
        }
        Ok(state)
    }
}

impl State {
    fn assign_id(&mut self, native: Value) -> Value {
        let mut map = match native {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if !map.contains_key("id") {
            self.next_id += 1;
            map.insert("id".to_string(), Value::String(self.next_id.to_string()));
        }
        Value::Object(map)
    }
}

fn id_of(native: &Value) -> Option<String> {
    native.get("id").and_then(id_text)
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Every leaf of `filter` equals the same path in `native`.
fn matches_filter(native: &Value, filter: &Tree) -> bool {
    filter.leaf_paths().iter().all(|path| {
        let mut node = native;
        for atom in path {
            match node.get(atom) {
                Some(next) => node = next,
                None => return false,
            }
        }
        filter.get(path) == Some(node)
    })
}

impl Controller for MockController {
    fn create(&self, object_type: &str, payload: &Map<String, Value>) -> ControllerResult<Value> {
        let mut state = self.begin(object_type, Operation::Create, payload)?;
        let native = state.assign_id(Value::Object(payload.clone()));
        state
            .objects
            .entry(object_type.to_string())
            .or_default()
            .push(native.clone());
        Ok(native)
    }

    fn query(
        &self,
        object_type: &str,
        filter: &Map<String, Value>,
        payload: &Map<String, Value>,
    ) -> ControllerResult<Vec<Value>> {
        let state = self.begin(object_type, Operation::Query, payload)?;
        let filter = Tree::from_map(filter.clone());
        Ok(state
            .objects
            .get(object_type)
            .map(|all| {
                all.iter()
                    .filter(|native| matches_filter(native, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get(
        &self,
        object_type: &str,
        id: &str,
        payload: &Map<String, Value>,
    ) -> ControllerResult<Option<Value>> {
        let state = self.begin(object_type, Operation::Get, payload)?;
        Ok(state.objects.get(object_type).and_then(|all| {
            all.iter()
                .find(|native| id_of(native).as_deref() == Some(id))
                .cloned()
        }))
    }

    /// Stores `object` with `payload` merged on top.
    fn update(
        &self,
        object_type: &str,
        object: &Value,
        payload: &Map<String, Value>,
    ) -> ControllerResult<Value> {
        let mut state = self.begin(object_type, Operation::Update, payload)?;
        let id = id_of(object).ok_or_else(|| ControllerError::failed("object has no id"))?;

        let mut merged = Tree::from_value(object.clone());
        let mut patch = payload.clone();
        patch.remove("id");
        merged.merge(&Tree::from_map(patch));
        let merged = merged.into_value();

        let stored = state
            .objects
            .get_mut(object_type)
            .and_then(|all| all.iter_mut().find(|n| id_of(n).as_deref() == Some(id.as_str())))
            .ok_or_else(|| ControllerError::failed(format!("no {object_type} with id {id}")))?;
        *stored = merged.clone();
        Ok(merged)
    }

    fn delete(&self, object_type: &str, payload: &Map<String, Value>) -> ControllerResult<bool> {
        let mut state = self.begin(object_type, Operation::Delete, payload)?;
        let Some(id) = payload.get("id").and_then(id_text) else {
            return Ok(false);
        };
        let Some(all) = state.objects.get_mut(object_type) else {
            return Ok(false);
        };
        let before = all.len();
        all.retain(|native| id_of(native).as_deref() != Some(id.as_str()));
        Ok(all.len() < before)
    }
}
