//! Dispatch contracts (DISPATCH-001 through DISPATCH-004)

use std::sync::{Arc, Mutex};

use serde_json::json;
use tessera::application::ControllerMapping;
use tessera::{
    HandlerContext, HandlerOutput, Need, Operation, Params, ResolvedObject, SchemaRegistry,
};

use crate::common::*;

/// CONTRACT DISPATCH-001: a dependency exists before its dependent runs
#[test]
fn contract_dependency_before_dependent() {
    let env = TestEnv::new(&chain_schema(4));

    env.dispatcher.create("t3", Params::new()).unwrap();

    assert_eq!(env.created_types(), vec!["t0", "t1", "t2", "t3"]);
}

type Seen = Arc<Mutex<Vec<(&'static str, ResolvedObject)>>>;

fn record_network(
    name: &'static str,
    seen: Seen,
) -> impl Fn(&mut HandlerContext<'_>) -> anyhow::Result<HandlerOutput> + Send + Sync + 'static {
    move |ctx| {
        let network = ctx.object("network").cloned().expect("network resolved");
        seen.lock().unwrap().push((name, network));
        Ok(ctx.controller_create()?.into())
    }
}

/// CONTRACT DISPATCH-002: one resolution per type per outer request
#[test]
fn contract_shared_dependency_is_the_same_instance() {
    let seen: Seen = Arc::default();
    let mut registry = network_schema();
    registry
        .define_object("subnet", |obj| {
            obj.handler(Operation::Create, record_network("subnet", seen.clone()))
        })
        .define_object("port", |obj| {
            obj.handler(Operation::Create, record_network("port", seen.clone()))
        });
    let env = TestEnv::new(&registry);

    env.dispatcher.create("server", Params::new()).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].1.same_instance(&seen[1].1));
    assert_eq!(env.controller.count(Operation::Create, "network"), 1);
}

/// CONTRACT DISPATCH-003: write then read through a mapping is symmetric
#[test]
fn contract_mapping_symmetry() {
    let mapping = ControllerMapping::new().object("server", |m| {
        m.map_attr("image", ["image", "id"])
            .map_value("state", "running", "ACTIVE")
    });
    let mut registry = SchemaRegistry::new();
    registry.define_object("server", |obj| obj.use_controller([Operation::Create]));
    let env = TestEnv::with_mapping(&registry, mapping);

    let server = env.dispatcher.create("server", Params::new()).unwrap();
    server.set("image", "img-7").unwrap();
    server.set("state", "running").unwrap();

    assert_eq!(server.get("image"), Some(json!("img-7")));
    assert_eq!(server.get("state"), Some(json!("running")));
    assert_eq!(server.native()["image"]["id"], json!("img-7"));
    assert_eq!(server.native()["state"], json!("ACTIVE"));
}

/// CONTRACT DISPATCH-004: failures of one top-level call leave others intact
#[test]
fn contract_failed_request_does_not_poison_the_next() {
    let mut registry = network_schema();
    registry.define_object("volume", |obj| {
        obj.use_controller([Operation::Create])
            .needs(Need::data("size").required())
    });
    let env = TestEnv::new(&registry);

    assert!(env.dispatcher.create("volume", Params::new()).is_err());
    let volume = env
        .dispatcher
        .create("volume", json!({"size": 20}))
        .unwrap();
    assert_eq!(volume.get("size"), Some(json!(20)));
}
