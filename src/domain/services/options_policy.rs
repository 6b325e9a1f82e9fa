//! Per-layer option overrides
//!
//! A stack asks its policy for fresh [`StoreOptions`] before touching each
//! layer, so section forcing and readonly flags never leak between calls.

use crate::domain::entities::ConfigLayer;
use crate::domain::value_objects::{Access, KeyPath, StoreOptions};

pub trait OptionsPolicy: Send + Sync {
    /// Options for `layer` (at stack `index`). `key` is `None` for load/save.
    fn options_for(
        &self,
        index: usize,
        layer: &ConfigLayer,
        key: Option<&KeyPath>,
        access: Access,
    ) -> StoreOptions;
}

/// No overrides: the key's own section applies and only the layer's
/// `file_readonly` flag is carried over.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPolicy;

impl OptionsPolicy for PlainPolicy {
    fn options_for(
        &self,
        _index: usize,
        layer: &ConfigLayer,
        _key: Option<&KeyPath>,
        _access: Access,
    ) -> StoreOptions {
        StoreOptions::new().file_readonly(layer.file_readonly)
    }
}
