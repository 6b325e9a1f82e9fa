//! Scenario: runtime override over persisted defaults
//!
//! Steps:
//! 1. Stack `runtime(rw) > local(rw, load/save) > default(ro, load)`
//! 2. `default` holds `course: Unset`, `local` is empty
//! 3. Set `course = Art` (lands in runtime), read it back
//! 4. Delete it from runtime, the default shows through again

use serde_json::json;
use tempfile::TempDir;
use tessera::{ConfigLayer, LayerStack};

#[test]
fn scenario_runtime_override_then_fallback_to_default() {
    let dir = TempDir::new().unwrap();
    let defaults = dir.path().join("defaults.yaml");
    std::fs::write(&defaults, "course: Unset\n").unwrap();

    let mut stack = LayerStack::from_layers(vec![
        ConfigLayer::new("runtime").writable(),
        ConfigLayer::new("local")
            .writable()
            .loadable()
            .savable()
            .with_filename(dir.path().join("local.yaml")),
        ConfigLayer::new("default")
            .loadable()
            .with_filename(&defaults),
    ])
    .unwrap();
    assert!(stack.load("default").unwrap());

    stack.set("course", "Art").unwrap();
    assert_eq!(stack.get("course").unwrap(), Some(json!("Art")));
    assert_eq!(stack.where_is("course").unwrap(), vec!["runtime", "default"]);

    stack.del("course").unwrap();
    assert_eq!(stack.get("course").unwrap(), Some(json!("Unset")));

    // the readonly default layer never changes
    assert_eq!(stack.set_in("default", "course", "Math").unwrap(), None);
    assert_eq!(stack.del_in("default", "course").unwrap(), None);
    assert_eq!(stack.get("course").unwrap(), Some(json!("Unset")));
}

#[test]
fn scenario_local_layer_survives_restart() {
    let dir = TempDir::new().unwrap();
    let local = dir.path().join("local.yaml");
    let layers = || {
        vec![
            ConfigLayer::new("runtime").writable(),
            ConfigLayer::new("local")
                .writable()
                .loadable()
                .savable()
                .with_filename(&local),
        ]
    };

    let mut first = LayerStack::from_layers(layers()).unwrap();
    first.set_in("local", "region", "eu-west").unwrap();
    first.set_in("local", ["network", "cidr"], "10.0.0.0/16").unwrap();
    assert!(first.save("local").unwrap());

    let mut second = LayerStack::from_layers(layers()).unwrap();
    assert!(second.load("local").unwrap());
    assert_eq!(second.get("region").unwrap(), Some(json!("eu-west")));
    assert_eq!(second.get("network/cidr").unwrap(), Some(json!("10.0.0.0/16")));
}
