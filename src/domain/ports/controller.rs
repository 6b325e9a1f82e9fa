//! Controller port - the provider backend behind every object type
//!
//! A controller implements raw CRUD primitives over its own native objects.
//! The dispatcher only ever hands it backend-side names (`hdata`) and reads
//! native objects back through `get_attr`/`set_attr`.

use serde_json::{Map, Value};

use crate::domain::value_objects::Operation;

pub type ControllerResult<T> = Result<T, ControllerError>;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ControllerError {
    /// The controller has no primitive for this type/operation pair
    #[error("{operation} is not supported for '{object_type}'")]
    Unsupported {
        object_type: String,
        operation: Operation,
    },

    /// Temporary backend condition (protocol hiccup, throttling); safe to retry
    #[error("transient backend error: {message}")]
    Transient { message: String },

    /// Hard backend failure
    #[error("{message}")]
    Failed { message: String },

    /// Native object does not have the shape the attribute path expects
    #[error("cannot address '{}' in native object", path.join("/"))]
    BadPath { path: Vec<String> },
}

impl ControllerError {
    pub fn unsupported(object_type: &str, operation: Operation) -> Self {
        ControllerError::Unsupported {
            object_type: object_type.to_string(),
            operation,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ControllerError::Failed {
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        ControllerError::Transient {
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ControllerError::Transient { .. })
    }
}

/// Provider backend.
///
/// Native objects are JSON values; what they contain is up to the controller.
/// `get_attr`/`set_attr` default to walking nested JSON objects.
pub trait Controller: Send + Sync {
    fn create(&self, object_type: &str, payload: &Map<String, Value>) -> ControllerResult<Value>;

    fn query(
        &self,
        object_type: &str,
        filter: &Map<String, Value>,
        payload: &Map<String, Value>,
    ) -> ControllerResult<Vec<Value>>;

    fn get(
        &self,
        object_type: &str,
        id: &str,
        payload: &Map<String, Value>,
    ) -> ControllerResult<Option<Value>>;

    fn update(
        &self,
        object_type: &str,
        object: &Value,
        payload: &Map<String, Value>,
    ) -> ControllerResult<Value>;

    fn delete(&self, object_type: &str, payload: &Map<String, Value>) -> ControllerResult<bool>;

    fn get_attr(&self, object: &Value, path: &[String]) -> Option<Value> {
        let mut node = object;
        for atom in path {
            node = node.as_object()?.get(atom)?;
        }
        Some(node.clone())
    }

    fn set_attr(&self, object: &mut Value, path: &[String], value: Value) -> ControllerResult<()> {
        let bad_path = || ControllerError::BadPath {
            path: path.to_vec(),
        };
        let (last, parents) = path.split_last().ok_or_else(bad_path)?;
        let mut node = object;
        for atom in parents {
            node = node
                .as_object_mut()
                .ok_or_else(bad_path)?
                .entry(atom.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        node.as_object_mut()
            .ok_or_else(bad_path)?
            .insert(last.clone(), value);
        Ok(())
    }
}
