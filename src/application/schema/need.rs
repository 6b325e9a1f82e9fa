//! Dependency declarations

use serde_json::Value;

use crate::domain::value_objects::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeedKind {
    /// A value from parameters, configuration or a default
    Data,
    /// Another declared object type
    Object,
}

/// One dependency of an object type.
///
/// Applies to `create` unless narrowed or widened with [`Need::for_ops`].
#[derive(Debug, Clone, PartialEq)]
pub struct Need {
    pub kind: NeedKind,
    pub name: String,
    pub required: bool,
    pub operations: Vec<Operation>,
    pub default: Option<Value>,
}

impl Need {
    pub fn data(name: impl Into<String>) -> Self {
        Self::new(NeedKind::Data, name.into())
    }

    pub fn object(object_type: impl Into<String>) -> Self {
        Self::new(NeedKind::Object, object_type.into())
    }

    fn new(kind: NeedKind, name: String) -> Self {
        Self {
            kind,
            name,
            required: false,
            operations: vec![Operation::Create],
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn for_ops(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations = operations.into_iter().collect();
        self
    }

    /// Value used when neither parameters nor configuration provide one.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn applies_to(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    pub fn is_object(&self) -> bool {
        self.kind == NeedKind::Object
    }
}
