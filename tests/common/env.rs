//! Test environment: dispatcher plus the mock controller behind it.

use std::sync::Arc;

use serde_json::Value;
use tessera::application::ControllerMapping;
use tessera::{Dispatcher, MockController, Operation, SchemaRegistry};

pub struct TestEnv {
    pub dispatcher: Dispatcher,
    pub controller: Arc<MockController>,
}

impl TestEnv {
    pub fn new(registry: &SchemaRegistry) -> Self {
        let controller = Arc::new(MockController::new());
        let dispatcher = Dispatcher::new(registry.build(), controller.clone());
        Self {
            dispatcher,
            controller,
        }
    }

    pub fn with_mapping(registry: &SchemaRegistry, mapping: ControllerMapping) -> Self {
        let controller = Arc::new(MockController::new());
        let dispatcher =
            Dispatcher::new(registry.build(), controller.clone()).with_controller_mapping(mapping);
        Self {
            dispatcher,
            controller,
        }
    }

    /// Object types of every controller `create`, in call order.
    pub fn created_types(&self) -> Vec<String> {
        self.controller
            .calls()
            .into_iter()
            .filter(|c| c.operation == Operation::Create)
            .map(|c| c.object_type)
            .collect()
    }

    pub fn seed(&self, object_type: &str, native: Value) -> Value {
        self.controller.seed(object_type, native)
    }
}
