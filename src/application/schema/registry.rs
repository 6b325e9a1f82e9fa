//! Schema registry
//!
//! Object types and attribute metadata are declared once through builders and
//! frozen into an immutable [`Schema`].
//!
//! ```ignore
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .define_object("student", |obj| {
//!         obj.use_controller([Operation::Create, Operation::Query])
//!             .needs(Need::data("student_name").required())
//!             .needs(Need::data("course"))
//!             .soft_delete("status", "active")
//!     })
//!     .define_attribute("student", "student_name", AttributeMeta::default());
//! let schema = registry.build();
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::application::handler::{HandlerContext, HandlerOutput, ProcessHandler};
use crate::domain::entities::Tree;
use crate::domain::services::metadata::{section_path, AttributeMeta};
use crate::domain::value_objects::Operation;
use crate::error::{TesseraError, TesseraResult};

use super::declaration::{HandlerBinding, ObjectTypeDeclaration, SoftDelete};
use super::need::Need;

pub struct ObjectTypeBuilder {
    decl: ObjectTypeDeclaration,
}

impl ObjectTypeBuilder {
    /// Bind a process handler to one operation.
    pub fn handler(mut self, operation: Operation, handler: impl ProcessHandler + 'static) -> Self {
        self.decl
            .bindings
            .insert(operation, HandlerBinding::Process(Arc::new(handler)));
        self
    }

    /// Bind a closure as the process handler for one operation.
    pub fn process<F>(self, operation: Operation, handler: F) -> Self
    where
        F: Fn(&mut HandlerContext<'_>) -> anyhow::Result<HandlerOutput> + Send + Sync + 'static,
    {
        self.handler(operation, handler)
    }

    /// Bind operations straight to the controller primitives.
    pub fn use_controller(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        for operation in operations {
            self.decl.bindings.insert(operation, HandlerBinding::Controller);
        }
        self
    }

    pub fn needs(mut self, need: Need) -> Self {
        self.decl.needs.retain(|n| n.name != need.name || n.kind != need.kind);
        self.decl.needs.push(need);
        self
    }

    pub fn soft_delete(mut self, attribute: impl Into<String>, active: impl Into<Value>) -> Self {
        self.decl.soft_delete = Some(SoftDelete {
            attribute: attribute.into(),
            active: active.into(),
        });
        self
    }
}

#[derive(Default)]
pub struct SchemaRegistry {
    order: Vec<String>,
    types: HashMap<String, ObjectTypeDeclaration>,
    app: Tree,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an object type, or extend an existing declaration.
    pub fn define_object<F>(&mut self, name: &str, build: F) -> &mut Self
    where
        F: FnOnce(ObjectTypeBuilder) -> ObjectTypeBuilder,
    {
        let decl = match self.types.remove(name) {
            Some(existing) => existing,
            None => {
                self.order.push(name.to_string());
                ObjectTypeDeclaration::new(name)
            }
        };
        let built = build(ObjectTypeBuilder { decl }).decl;
        debug!(object_type = name, needs = built.needs.len(), "object type declared");
        self.types.insert(name.to_string(), built);
        self
    }

    /// Declare an attribute in the application metadata.
    pub fn define_attribute(&mut self, section: &str, key: &str, meta: AttributeMeta) -> &mut Self {
        let value = serde_json::to_value(&meta).unwrap_or(Value::Null);
        self.app.set(&section_path(section, key), value);
        self
    }

    /// Merge a raw metadata tree into the application layer.
    pub fn merge_app(&mut self, tree: &Tree) -> &mut Self {
        self.app.merge(tree);
        self
    }

    pub fn build(&self) -> Arc<Schema> {
        Arc::new(Schema {
            order: self.order.clone(),
            types: self.types.clone(),
            app: self.app.clone(),
        })
    }
}

/// Frozen schema shared by dispatchers.
#[derive(Debug)]
pub struct Schema {
    order: Vec<String>,
    types: HashMap<String, ObjectTypeDeclaration>,
    app: Tree,
}

impl Schema {
    pub fn object_type(&self, name: &str) -> TesseraResult<&ObjectTypeDeclaration> {
        self.types
            .get(name)
            .ok_or_else(|| TesseraError::UnknownObjectType {
                object_type: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Declared type names, in declaration order.
    pub fn type_names(&self) -> &[String] {
        &self.order
    }

    /// Application metadata tree (the `app` metadata layer).
    pub fn app(&self) -> &Tree {
        &self.app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn define_object_collects_bindings_and_needs() {
        let mut registry = SchemaRegistry::new();
        registry.define_object("student", |obj| {
            obj.use_controller([Operation::Create, Operation::Query])
                .needs(Need::data("student_name").required())
                .needs(Need::data("course"))
                .soft_delete("status", "active")
        });
        let schema = registry.build();

        let student = schema.object_type("student").unwrap();
        assert!(matches!(
            student.binding(Operation::Create),
            Some(HandlerBinding::Controller)
        ));
        assert!(student.binding(Operation::Delete).is_none());
        assert_eq!(student.needs_for(Operation::Create).count(), 2);
        assert_eq!(student.needs_for(Operation::Query).count(), 0);
        assert_eq!(student.soft_delete().unwrap().active, json!("active"));
    }

    #[test]
    fn redefining_extends_declaration() {
        let mut registry = SchemaRegistry::new();
        registry
            .define_object("network", |obj| obj.use_controller([Operation::Create]))
            .define_object("subnet", |obj| obj.needs(Need::object("network").required()))
            .define_object("network", |obj| {
                obj.process(Operation::Delete, |_ctx| Ok(HandlerOutput::Deleted(true)))
            });
        let schema = registry.build();

        let network = schema.object_type("network").unwrap();
        assert!(network.binding(Operation::Create).is_some());
        assert!(matches!(
            network.binding(Operation::Delete),
            Some(HandlerBinding::Process(_))
        ));
        assert_eq!(schema.type_names(), ["network", "subnet"]);
    }

    #[test]
    fn same_need_declared_twice_keeps_last() {
        let mut registry = SchemaRegistry::new();
        registry.define_object("server", |obj| {
            obj.needs(Need::data("flavor"))
                .needs(Need::data("flavor").required())
        });
        let schema = registry.build();
        let needs = schema.object_type("server").unwrap().needs();
        assert_eq!(needs.len(), 1);
        assert!(needs[0].required);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let schema = SchemaRegistry::new().build();
        assert!(matches!(
            schema.object_type("ghost"),
            Err(TesseraError::UnknownObjectType { .. })
        ));
    }

    #[test]
    fn attributes_land_in_app_tree() {
        let mut registry = SchemaRegistry::new();
        registry.define_attribute(
            "account",
            "provider",
            AttributeMeta::default().account_exclusive(),
        );
        let schema = registry.build();
        assert_eq!(
            schema.app().clone().into_value(),
            json!({"sections": {"account": {"provider": {"account_exclusive": true}}}})
        );
    }
}
