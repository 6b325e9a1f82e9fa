//! Application Layer
//!
//! Runs declared object types against a controller:
//!
//! - `SchemaRegistry` / `Schema` - object type declarations, dependencies and
//!   handler bindings
//! - `Dispatcher` - dependency resolution and create/get/query/update/delete
//! - `HandlerContext` - what a process handler sees and may call back into
//! - `AccountConfig` - the standard account-aware configuration stack
//! - `retry_with` - bounded retry for handler code

pub mod account;
mod context;
mod dispatcher;
mod handler;
pub mod retry;
pub mod schema;

pub use account::AccountConfig;
pub use context::{CallContext, Params};
pub use dispatcher::Dispatcher;
pub use handler::{HandlerContext, HandlerOutput, ProcessHandler};
pub use retry::{retry_with, transient_only, RetryDecision, RetryPolicy};
pub use schema::{
    ControllerMapping, HandlerBinding, Need, NeedKind, ObjectMapping, ObjectTypeBuilder,
    ObjectTypeDeclaration, Schema, SchemaRegistry, SoftDelete,
};
