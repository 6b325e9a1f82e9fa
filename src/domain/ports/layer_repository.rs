//! LayerRepository port - reads and writes a whole layer tree from a file

use std::path::{Path, PathBuf};

use crate::domain::entities::Tree;

pub trait LayerRepository: Send + Sync {
    fn read(&self, path: &Path) -> Result<Tree, LayerFileError>;

    fn write(&self, path: &Path, tree: &Tree) -> Result<(), LayerFileError>;

    fn exists(&self, path: &Path) -> bool;

    /// Delete the stored layer. `false` when nothing was stored at `path`.
    fn remove(&self, path: &Path) -> Result<bool, LayerFileError>;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LayerFileError {
    #[error("layer file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to access {path}: {message}")]
    AccessError { path: PathBuf, message: String },

    #[error("layer file {path} is corrupted: {message}")]
    Corrupted { path: PathBuf, message: String },

    #[error("failed to serialize layer for {path}: {message}")]
    SerializationError { path: PathBuf, message: String },

    #[error("layer '{layer}' has no file attached")]
    NoFilename { layer: String },
}
