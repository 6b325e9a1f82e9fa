//! Controller-side metadata: attribute mappings, payload declarations and
//! attribute overrides, rendered into the `controller` metadata layer.

use serde_json::Value;

use crate::domain::entities::{AttrMapping, Tree};
use crate::domain::services::metadata::{object_path, section_path, AttributeMeta, HdataEntry};

#[derive(Debug, Clone, Default)]
pub struct ObjectMapping {
    attrs: Vec<(String, AttrMapping)>,
    undefined: Vec<String>,
    hdata: Vec<HdataEntry>,
}

impl ObjectMapping {
    fn attr_mut(&mut self, attr: &str) -> &mut AttrMapping {
        let index = match self.attrs.iter().position(|(a, _)| a == attr) {
            Some(index) => index,
            None => {
                self.attrs
                    .push((attr.to_string(), AttrMapping::to_path([attr])));
                self.attrs.len() - 1
            }
        };
        &mut self.attrs[index].1
    }

    /// Read/write `attr` at `path` inside the native object.
    pub fn map_attr<I, S>(mut self, attr: &str, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attr_mut(attr).path = path.into_iter().map(Into::into).collect();
        self
    }

    /// Declare `process` and `backend` as the same value of `attr`.
    pub fn map_value(
        mut self,
        attr: &str,
        process: impl Into<Value>,
        backend: impl Into<Value>,
    ) -> Self {
        let mapping = self.attr_mut(attr);
        *mapping = std::mem::take(mapping).with_value(process, backend);
        self
    }

    /// Context value at `source` goes to `target` in the backend payload.
    pub fn hdata<I, S, J, T>(mut self, source: I, target: J) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.hdata.push(HdataEntry {
            source: source.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Hide `attr` on objects of this type.
    pub fn undefine(mut self, attr: &str) -> Self {
        self.undefined.push(attr.to_string());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ControllerMapping {
    objects: Vec<(String, ObjectMapping)>,
    overrides: Vec<(String, String, AttributeMeta)>,
}

impl ControllerMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object<F>(mut self, object_type: &str, build: F) -> Self
    where
        F: FnOnce(ObjectMapping) -> ObjectMapping,
    {
        let existing = self
            .objects
            .iter()
            .position(|(t, _)| t == object_type)
            .map(|index| self.objects.remove(index).1)
            .unwrap_or_default();
        self.objects.push((object_type.to_string(), build(existing)));
        self
    }

    /// Replace fields of an application attribute declaration.
    pub fn override_attribute(mut self, section: &str, key: &str, meta: AttributeMeta) -> Self {
        self.overrides
            .push((section.to_string(), key.to_string(), meta));
        self
    }

    pub fn into_tree(self) -> Tree {
        let mut tree = Tree::new();
        for (object_type, mapping) in self.objects {
            for (attr, attr_mapping) in mapping.attrs {
                let mut path = object_path(&object_type, "mapping");
                path.push(attr);
                tree.set(&path, to_value(&attr_mapping));
            }
            if !mapping.undefined.is_empty() {
                tree.set(
                    &object_path(&object_type, "undefined"),
                    Value::from(mapping.undefined),
                );
            }
            if !mapping.hdata.is_empty() {
                tree.set(&object_path(&object_type, "hdata"), to_value(&mapping.hdata));
            }
        }
        for (section, key, meta) in self.overrides {
            tree.set(&section_path(&section, &key), to_value(&meta));
        }
        tree
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
