//! Repository Implementations
//!
//! Concrete implementations of domain repository ports.

mod yaml_layer;

pub use yaml_layer::YamlLayerRepository;
