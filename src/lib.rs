//! Tessera - layered configuration and declarative object dispatch
//!
//! Tessera lets an application declare object types, their dependencies and
//! the handlers that create, query, update and delete them, then runs those
//! requests against any provider backend (a `Controller`). Configuration is
//! read from an ordered stack of layers with deterministic precedence.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod settings;

// Re-exports for convenience
pub use application::{
    AccountConfig, CallContext, ControllerMapping, Dispatcher, HandlerContext, HandlerOutput,
    Need, Params, ProcessHandler, RetryPolicy, Schema, SchemaRegistry,
};
pub use domain::entities::{ConfigLayer, ObjectList, ResolvedObject, Tree};
pub use domain::ports::{Controller, ControllerError, ControllerResult, LayerRepository};
pub use domain::services::{
    AttributeMeta, LayerSelector, LayerStack, MetadataModel, SharedConfig, SharedMetadata,
};
pub use domain::value_objects::{KeyPath, Operation};
pub use error::{ErrorKind, TesseraError, TesseraResult};
pub use infrastructure::{MockController, YamlLayerRepository};
pub use settings::Settings;
