//! Layer stack contracts (LAYER-001 through LAYER-005)

use serde_json::json;
use tempfile::TempDir;
use tessera::domain::services::MetadataPolicy;
use tessera::{ConfigLayer, LayerStack, MetadataModel, Tree};

fn three_layers() -> LayerStack {
    LayerStack::from_layers(vec![
        ConfigLayer::new("runtime").writable(),
        ConfigLayer::new("local").writable(),
        ConfigLayer::new("default").with_values(Tree::from_value(json!({
            "course": "Unset",
            "room": "B12",
        }))),
    ])
    .unwrap()
}

/// CONTRACT LAYER-001: the highest-priority holder wins
#[test]
fn contract_priority_order() {
    let mut stack = three_layers();
    stack.set_in("local", "course", "Math").unwrap();
    assert_eq!(stack.get("course").unwrap(), Some(json!("Math")));

    stack.set_in("runtime", "course", "Art").unwrap();
    assert_eq!(stack.get("course").unwrap(), Some(json!("Art")));
    assert_eq!(
        stack.where_is("course").unwrap(),
        vec!["runtime", "local", "default"]
    );
}

/// CONTRACT LAYER-002: untargeted writes land in layer 0
#[test]
fn contract_untargeted_write_lands_on_top() {
    let mut stack = three_layers();
    stack.set("room", "C3").unwrap();

    assert_eq!(stack.get_in("runtime", "room").unwrap(), Some(json!("C3")));
    assert_eq!(stack.get_in("local", "room").unwrap(), None);
    assert_eq!(stack.get("room").unwrap(), Some(json!("C3")));
}

/// CONTRACT LAYER-003: readonly layers never change
#[test]
fn contract_readonly_layer_is_immutable() {
    let mut stack = three_layers();
    let before = stack.layer("default").unwrap().values().clone();

    assert_eq!(stack.set_in("default", "course", "x").unwrap(), None);
    assert_eq!(stack.del_in("default", "room").unwrap(), None);
    assert!(!stack.clear("default").unwrap());

    assert_eq!(stack.layer("default").unwrap().values(), &before);
}

/// CONTRACT LAYER-004: save then load reproduces the layer
#[test]
fn contract_save_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("nested").join("local.yaml");
    let layer = || {
        ConfigLayer::new("local")
            .writable()
            .sectioned()
            .loadable()
            .savable()
            .with_filename(&file)
    };

    let mut stack = LayerStack::from_layers(vec![layer()]).unwrap();
    stack.set("compute#region", "eu").unwrap();
    stack.set("storage#region", "us").unwrap();
    stack.set("tags/env", "prod").unwrap();
    assert!(stack.save("local").unwrap());

    let mut fresh = LayerStack::from_layers(vec![layer()]).unwrap();
    assert!(fresh.load("local").unwrap());
    assert_eq!(
        fresh.layer("local").unwrap().values(),
        stack.layer("local").unwrap().values()
    );
}

/// CONTRACT LAYER-005: `section#key` resolves independently of auto-placement
#[test]
fn contract_section_disambiguation() {
    let metadata = MetadataModel::new(Tree::from_value(json!({
        "sections": {
            "compute": {"region": {}},
            "storage": {"region": {}},
        }
    })))
    .into_shared();
    let mut stack = LayerStack::from_layers(vec![ConfigLayer::new("account")
        .writable()
        .sectioned()])
    .unwrap()
    .with_policy(std::sync::Arc::new(MetadataPolicy::new(metadata)));

    stack.set("compute#region", "eu").unwrap();
    stack.set("storage#region", "us").unwrap();

    assert_eq!(stack.get("compute#region").unwrap(), Some(json!("eu")));
    assert_eq!(stack.get("storage#region").unwrap(), Some(json!("us")));
    // no section: first declared wins
    assert_eq!(stack.get("region").unwrap(), Some(json!("eu")));
}
