//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//!
//! - `repositories/` - layer file persistence (YAML)
//! - `controllers/` - reference controller backends

pub mod controllers;
pub mod repositories;

pub use controllers::{ControllerCall, MockController};
pub use repositories::YamlLayerRepository;
