//! Query result: an ordered collection of resolved objects of one type

use serde_json::{Map, Value};

use crate::domain::entities::ResolvedObject;

#[derive(Debug, Clone)]
pub struct ObjectList {
    object_type: String,
    filter: Map<String, Value>,
    items: Vec<ResolvedObject>,
}

impl ObjectList {
    pub fn new(
        object_type: impl Into<String>,
        filter: Map<String, Value>,
        items: Vec<ResolvedObject>,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            filter,
            items,
        }
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Filter the list was produced with (process-side names).
    pub fn filter(&self) -> &Map<String, Value> {
        &self.filter
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&ResolvedObject> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedObject> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<ResolvedObject> {
        self.items
    }
}

impl IntoIterator for ObjectList {
    type Item = ResolvedObject;
    type IntoIter = std::vec::IntoIter<ResolvedObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ObjectList {
    type Item = &'a ResolvedObject;
    type IntoIter = std::slice::Iter<'a, ResolvedObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
