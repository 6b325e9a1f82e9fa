#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // Layer documents arrive as arbitrary YAML; tree operations must hold up
        if let Ok(value) = serde_yaml_ng::from_str::<serde_json::Value>(content) {
            let mut tree = tessera::Tree::from_value(value);
            for path in tree.leaf_paths() {
                let _ = tree.get(&path);
            }
            let snapshot = tree.clone();
            tree.merge(&snapshot);
            let _ = serde_yaml_ng::to_string(&tree);
        }
    }
});
