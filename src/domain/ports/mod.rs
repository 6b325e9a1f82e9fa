//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod controller;
pub mod layer_repository;

pub use controller::{Controller, ControllerError, ControllerResult};
pub use layer_repository::{LayerFileError, LayerRepository};
