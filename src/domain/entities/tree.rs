//! Recursive map addressed by key-path slices
//!
//! Every config store and every metadata layer holds one `Tree`. Intermediate
//! nodes are JSON objects; anything else is a leaf.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tree(Map<String, Value>);

impl Tree {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wrap a JSON value; non-object values produce an empty tree.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn get(&self, path: &[String]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        let mut node = &self.0;
        for atom in parents {
            node = node.get(atom)?.as_object()?;
        }
        node.get(last)
    }

    pub fn exist(&self, path: &[String]) -> bool {
        self.get(path).is_some()
    }

    /// Store `value` at `path`, creating (or replacing non-map) intermediate nodes.
    ///
    /// Returns the previous value, if any. An empty path is a no-op.
    pub fn set(&mut self, path: &[String], value: Value) -> Option<Value> {
        let (last, parents) = path.split_last()?;
        let mut node = &mut self.0;
        for atom in parents {
            let entry = node
                .entry(atom.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            node = match entry {
                Value::Object(map) => map,
                _ => return None,
            };
        }
        node.insert(last.clone(), value)
    }

    /// Remove the leaf (or subtree) at `path`. Parents are left in place.
    pub fn del(&mut self, path: &[String]) -> Option<Value> {
        let (last, parents) = path.split_last()?;
        let mut node = &mut self.0;
        for atom in parents {
            node = node.get_mut(atom)?.as_object_mut()?;
        }
        node.remove(last)
    }

    /// Deep merge `other` on top of `self`: maps merge, leaves replace.
    pub fn merge(&mut self, other: &Tree) {
        merge_maps(&mut self.0, &other.0);
    }

    /// Every leaf path, depth first, in insertion order.
    pub fn leaf_paths(&self) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        collect_leaves(&self.0, &mut Vec::new(), &mut out);
        out
    }
}

fn merge_maps(base: &mut Map<String, Value>, over: &Map<String, Value>) {
    for (key, value) in over {
        match (base.get_mut(key), value) {
            (Some(Value::Object(dst)), Value::Object(src)) => merge_maps(dst, src),
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

fn collect_leaves(map: &Map<String, Value>, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    for (key, value) in map {
        prefix.push(key.clone());
        match value {
            Value::Object(child) if !child.is_empty() => collect_leaves(child, prefix, out),
            _ => out.push(prefix.clone()),
        }
        prefix.pop();
    }
}

impl From<Map<String, Value>> for Tree {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(atoms: &[&str]) -> Vec<String> {
        atoms.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn set_creates_intermediate_maps() {
        let mut tree = Tree::new();
        tree.set(&p(&["a", "b", "c"]), json!(1));
        assert_eq!(tree.get(&p(&["a", "b", "c"])), Some(&json!(1)));
        assert!(tree.get(&p(&["a", "b"])).unwrap().is_object());
    }

    #[test]
    fn set_replaces_leaf_on_path() {
        let mut tree = Tree::new();
        tree.set(&p(&["a"]), json!("leaf"));
        tree.set(&p(&["a", "b"]), json!(2));
        assert_eq!(tree.get(&p(&["a", "b"])), Some(&json!(2)));
    }

    #[test]
    fn get_through_leaf_is_none() {
        let mut tree = Tree::new();
        tree.set(&p(&["a"]), json!("leaf"));
        assert_eq!(tree.get(&p(&["a", "b"])), None);
        assert!(!tree.exist(&p(&["a", "b"])));
    }

    #[test]
    fn empty_path_is_noop() {
        let mut tree = Tree::new();
        assert_eq!(tree.set(&[], json!(1)), None);
        assert!(tree.is_empty());
        assert_eq!(tree.get(&[]), None);
        assert_eq!(tree.del(&[]), None);
    }

    #[test]
    fn del_only_removes_leaf() {
        let mut tree = Tree::new();
        tree.set(&p(&["a", "b"]), json!(1));
        tree.set(&p(&["a", "c"]), json!(2));
        assert_eq!(tree.del(&p(&["a", "b"])), Some(json!(1)));
        assert_eq!(tree.get(&p(&["a", "c"])), Some(&json!(2)));
    }

    #[test]
    fn merge_is_deep() {
        let mut base = Tree::from_value(json!({"a": {"x": 1, "y": 2}, "b": 1}));
        let over = Tree::from_value(json!({"a": {"y": 3}, "c": 4}));
        base.merge(&over);
        assert_eq!(
            base.into_value(),
            json!({"a": {"x": 1, "y": 3}, "b": 1, "c": 4})
        );
    }

    #[test]
    fn leaf_paths_in_insertion_order() {
        let tree = Tree::from_value(json!({"s1": {"k1": 1, "k2": 2}, "s2": {"k1": 3}}));
        assert_eq!(
            tree.leaf_paths(),
            vec![p(&["s1", "k1"]), p(&["s1", "k2"]), p(&["s2", "k1"])]
        );
    }
}
