//! Metadata-driven options policy
//!
//! - section: explicit `section#key`, else the first section the metadata
//!   lists for the key, else the store default
//! - writes of `readonly` keys are rejected on every layer
//! - writes of `account_exclusive` keys are rejected outside the exclusive
//!   layers (the two highest-priority layers unless named explicitly)

use std::sync::PoisonError;

use crate::domain::entities::ConfigLayer;
use crate::domain::services::metadata::SharedMetadata;
use crate::domain::services::options_policy::OptionsPolicy;
use crate::domain::value_objects::{Access, KeyPath, StoreOptions};

const DEFAULT_EXCLUSIVE_DEPTH: usize = 2;

#[derive(Debug, Clone)]
enum Exclusive {
    Top(usize),
    Named(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct MetadataPolicy {
    metadata: SharedMetadata,
    exclusive: Exclusive,
}

impl MetadataPolicy {
    pub fn new(metadata: SharedMetadata) -> Self {
        Self {
            metadata,
            exclusive: Exclusive::Top(DEFAULT_EXCLUSIVE_DEPTH),
        }
    }

    /// Restrict `account_exclusive` writes to the named layers.
    pub fn with_exclusive_layers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusive = Exclusive::Named(names.into_iter().map(Into::into).collect());
        self
    }

    fn is_exclusive_layer(&self, index: usize, layer: &ConfigLayer) -> bool {
        match &self.exclusive {
            Exclusive::Top(depth) => index < *depth,
            Exclusive::Named(names) => names.iter().any(|n| *n == layer.name),
        }
    }
}

impl OptionsPolicy for MetadataPolicy {
    fn options_for(
        &self,
        index: usize,
        layer: &ConfigLayer,
        key: Option<&KeyPath>,
        access: Access,
    ) -> StoreOptions {
        let options = StoreOptions::new().file_readonly(layer.file_readonly);
        let Some(key) = key else {
            return options;
        };

        let metadata = self.metadata.read().unwrap_or_else(PoisonError::into_inner);
        let Some(section) = metadata.section_of(key) else {
            return options;
        };
        let meta = metadata.attribute(&section, key.head());
        let options = options.with_section(section);

        if access != Access::Write {
            return options;
        }
        let readonly = meta.is_some_and(|m| {
            m.readonly || (m.account_exclusive && !self.is_exclusive_layer(index, layer))
        });
        options.data_readonly(readonly)
    }
}
