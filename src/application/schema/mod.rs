//! Object schema: type declarations, dependencies, handler bindings and
//! controller-side mappings.

mod controller_mapping;
mod declaration;
mod need;
mod registry;

pub use controller_mapping::{ControllerMapping, ObjectMapping};
pub use declaration::{HandlerBinding, ObjectTypeDeclaration, SoftDelete};
pub use need::{Need, NeedKind};
pub use registry::{ObjectTypeBuilder, Schema, SchemaRegistry};
