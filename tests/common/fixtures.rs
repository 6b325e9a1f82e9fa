//! Test fixtures - reusable schemas.

use serde_json::{json, Value};
use tessera::{Need, Operation, Params, SchemaRegistry};

pub const ALL_OPERATIONS: [Operation; 5] = Operation::ALL;

/// `student` backed by the controller, with a query-then-create handler.
pub fn school_schema() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.define_object("student", |obj| {
        obj.use_controller(ALL_OPERATIONS)
            .needs(Need::data("student_name").required())
            .needs(Need::data("course"))
            .soft_delete("status", "active")
            .process(Operation::Create, |ctx| {
                let name = ctx.value("student_name")?.unwrap_or(Value::Null);
                let existing =
                    ctx.query_single("student", json!({ "student_name": name }), Params::new())?;
                match existing {
                    Some(found) => Ok(found.into()),
                    None => Ok(ctx.controller_create()?.into()),
                }
            })
    });
    registry
}

/// `network <- subnet, port <- server`, all controller backed.
pub fn network_schema() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .define_object("network", |obj| obj.use_controller(ALL_OPERATIONS))
        .define_object("subnet", |obj| {
            obj.use_controller(ALL_OPERATIONS)
                .needs(Need::object("network").required())
        })
        .define_object("port", |obj| {
            obj.use_controller(ALL_OPERATIONS)
                .needs(Need::object("network").required())
        })
        .define_object("server", |obj| {
            obj.use_controller(ALL_OPERATIONS)
                .needs(Need::object("subnet").required())
                .needs(Need::object("port").required())
        });
    registry
}

/// Chain `t0 <- t1 <- ... <- t{depth-1}`, each requiring the previous.
pub fn chain_schema(depth: usize) -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    for index in 0..depth {
        let name = format!("t{index}");
        registry.define_object(&name, |obj| {
            let obj = obj.use_controller([Operation::Create]);
            if index == 0 {
                obj
            } else {
                obj.needs(Need::object(format!("t{}", index - 1)).required())
            }
        });
    }
    registry
}
