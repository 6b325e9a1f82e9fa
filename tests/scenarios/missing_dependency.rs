//! Scenario: a router interface without a router
//!
//! `router` cannot be created (no binding), so the interface fails before
//! any backend call is made.

use tessera::{ErrorKind, Need, Operation, Params, SchemaRegistry, TesseraError};

use crate::common::*;

fn routers() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .define_object("router", |obj| obj.use_controller([Operation::Query]))
        .define_object("router_interface", |obj| {
            obj.use_controller([Operation::Create])
                .needs(Need::object("router").required())
        });
    registry
}

#[test]
fn scenario_interface_without_router_fails_cleanly() {
    let env = TestEnv::new(&routers());

    let err = env
        .dispatcher
        .create("router_interface", Params::new())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingRequiredDependency);
    assert!(matches!(
        &err,
        TesseraError::MissingRequiredDependency { dependency, .. } if dependency == "router"
    ));
    assert!(env.controller.calls().is_empty());
}

#[test]
fn scenario_interface_with_existing_router_succeeds() {
    let env = TestEnv::new(&routers());
    let router = env.seed("router", serde_json::json!({"name": "gw"}));

    let found = env
        .dispatcher
        .query_single("router", serde_json::json!({"name": "gw"}), Params::new())
        .unwrap()
        .unwrap();
    let interface = env
        .dispatcher
        .create("router_interface", Params::new().with_object(found))
        .unwrap();

    assert_eq!(interface.get("router_id"), Some(router["id"].clone()));
    assert_eq!(env.created_types(), vec!["router_interface"]);
}
