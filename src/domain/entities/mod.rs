//! Domain Entities
//!
//! - `Tree` - recursive map addressed by key-path slices
//! - `DataStore` - flat or sectioned container of values
//! - `ConfigLayer` - a named store and its capabilities
//! - `ResolvedObject` / `ObjectList` - dispatcher results over backend data

mod config_layer;
mod data_store;
mod object_list;
mod resolved_object;
mod tree;

pub use config_layer::ConfigLayer;
pub use data_store::{DataStore, DEFAULT_SECTION};
pub use object_list::ObjectList;
pub use resolved_object::{AttrMapping, ResolvedObject, TypeMapping};
pub use tree::Tree;
