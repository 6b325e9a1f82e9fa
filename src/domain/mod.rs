//! Domain Layer
//!
//! The core of Tessera: configuration layers, metadata, and the object model.
//!
//! ## Structure
//!
//! - `entities/` - Tree, DataStore, ConfigLayer, ResolvedObject, ObjectList
//! - `value_objects/` - KeyPath, StoreOptions, Operation
//! - `services/` - LayerStack, MetadataModel, options policies, templates
//! - `ports/` - Controller and LayerRepository interfaces
//!
//! File and backend I/O only ever goes through the ports.

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
