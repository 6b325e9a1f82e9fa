//! Property tests for layer stack precedence and persistence.

use proptest::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

use tessera::{ConfigLayer, LayerStack, Tree};

const KEYS: [&str; 4] = ["course", "room", "teacher", "term"];

fn stack_of(depth: usize) -> LayerStack {
    let layers = (0..depth)
        .map(|index| ConfigLayer::new(format!("l{index}")).writable())
        .collect();
    LayerStack::from_layers(layers).unwrap()
}

fn writes(depth: usize) -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
    proptest::collection::vec((0..depth, 0..KEYS.len(), any::<i64>()), 0..24)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: `get` returns the value of the lowest-index layer holding the key.
    #[test]
    fn property_priority_invariant(ops in writes(4)) {
        let mut stack = stack_of(4);
        for (layer, key, value) in &ops {
            stack.set_in(*layer, KEYS[*key], *value).unwrap();
        }

        for key in KEYS {
            let expected = (0..4).find_map(|layer| stack.get_in(layer, key).unwrap());
            prop_assert_eq!(stack.get(key).unwrap(), expected);
        }
    }

    /// PROPERTY: an untargeted write is visible immediately.
    #[test]
    fn property_write_targets_top(ops in writes(3), key in 0..KEYS.len(), value in any::<i64>()) {
        let mut stack = stack_of(3);
        for (layer, k, v) in &ops {
            stack.set_in(*layer, KEYS[*k], *v).unwrap();
        }

        stack.set(KEYS[key], value).unwrap();
        prop_assert_eq!(stack.get(KEYS[key]).unwrap(), Some(json!(value)));
        prop_assert_eq!(stack.get_in(0usize, KEYS[key]).unwrap(), Some(json!(value)));
    }

    /// PROPERTY: no write sequence changes a readonly layer.
    #[test]
    fn property_readonly_layer_unchanged(ops in writes(2)) {
        let base = Tree::from_value(json!({"course": "Unset"}));
        let mut stack = LayerStack::from_layers(vec![
            ConfigLayer::new("runtime").writable(),
            ConfigLayer::new("default").with_values(base.clone()),
        ])
        .unwrap();

        for (layer, key, value) in &ops {
            stack.set_in(*layer, KEYS[*key], *value).unwrap();
            stack.del_in(*layer, KEYS[(*key + 1) % KEYS.len()]).unwrap();
        }
        prop_assert_eq!(stack.layer("default").unwrap().values(), &base);
    }

    /// PROPERTY: save followed by load reproduces the values.
    #[test]
    fn property_save_load_round_trip(
        entries in proptest::collection::btree_map("[a-z]{1,6}", "[a-zA-Z0-9 _-]{0,12}", 0..8),
    ) {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("layer.yaml");
        let layer = || {
            ConfigLayer::new("local")
                .writable()
                .loadable()
                .savable()
                .with_filename(&file)
        };

        let mut stack = LayerStack::from_layers(vec![layer()]).unwrap();
        for (key, value) in &entries {
            stack.set(key.as_str(), Value::String(value.clone())).unwrap();
        }
        prop_assert!(stack.save("local").unwrap());

        let mut fresh = LayerStack::from_layers(vec![layer()]).unwrap();
        prop_assert!(fresh.load("local").unwrap());
        prop_assert_eq!(
            fresh.layer("local").unwrap().values(),
            stack.layer("local").unwrap().values()
        );
    }
}
