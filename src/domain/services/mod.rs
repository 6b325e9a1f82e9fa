//! Domain Services
//!
//! Layered configuration engine and the metadata model that drives it.

pub mod layer_stack;
pub mod metadata;
mod metadata_policy;
mod options_policy;
mod template;

pub use layer_stack::{LayerSelector, LayerStack, SharedConfig};
pub use metadata::{AttributeMeta, HdataEntry, MetadataModel, SetupHints, SharedMetadata};
pub use metadata_policy::MetadataPolicy;
pub use options_policy::{OptionsPolicy, PlainPolicy};
pub use template::{BraceExpander, Lookup, NoExpansion, TemplateExpander};
