//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod key_path;
mod operation;
mod store_options;

pub use key_path::{IntoKeyPath, KeyPath, ATOM_SEPARATOR, SECTION_SEPARATOR};
pub use operation::Operation;
pub use store_options::{Access, StoreOptions};
