//! Immutable object type declarations

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::application::handler::ProcessHandler;
use crate::domain::value_objects::Operation;

use super::need::Need;

/// What runs for one (object type, operation) pair.
#[derive(Clone)]
pub enum HandlerBinding {
    Process(Arc<dyn ProcessHandler>),
    /// Call the controller primitive directly with the backend payload
    Controller,
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerBinding::Process(_) => f.write_str("Process(..)"),
            HandlerBinding::Controller => f.write_str("Controller"),
        }
    }
}

/// Status attribute hiding records that are not active from queries.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftDelete {
    pub attribute: String,
    pub active: Value,
}

#[derive(Debug, Clone)]
pub struct ObjectTypeDeclaration {
    pub(crate) name: String,
    pub(crate) bindings: HashMap<Operation, HandlerBinding>,
    pub(crate) needs: Vec<Need>,
    pub(crate) soft_delete: Option<SoftDelete>,
}

impl ObjectTypeDeclaration {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: HashMap::new(),
            needs: Vec::new(),
            soft_delete: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binding(&self, operation: Operation) -> Option<&HandlerBinding> {
        self.bindings.get(&operation)
    }

    pub fn needs(&self) -> &[Need] {
        &self.needs
    }

    /// Dependencies that apply to `operation`, in declaration order.
    pub fn needs_for(&self, operation: Operation) -> impl Iterator<Item = &Need> {
        self.needs.iter().filter(move |n| n.applies_to(operation))
    }

    pub fn soft_delete(&self) -> Option<&SoftDelete> {
        self.soft_delete.as_ref()
    }
}
