//! YAML Layer Repository
//!
//! Persists a whole layer tree as one YAML document. Sectioned layers keep
//! their sections as top-level keys. Writes hold an exclusive lock on a
//! sibling `.lock` file and replace the target atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::domain::entities::Tree;
use crate::domain::ports::{LayerFileError, LayerRepository};

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlLayerRepository;

impl YamlLayerRepository {
    pub fn new() -> Self {
        Self
    }

    fn lock_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        path.with_file_name(name)
    }

    fn write_atomic(path: &Path, content: &str) -> Result<(), LayerFileError> {
        let access = |e: std::io::Error| LayerFileError::AccessError {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = NamedTempFile::new_in(&parent).map_err(access)?;
        tmp.write_all(content.as_bytes()).map_err(access)?;
        tmp.as_file().sync_all().map_err(access)?;
        tmp.persist(path).map_err(|e| access(e.error))?;
        Ok(())
    }
}

impl LayerRepository for YamlLayerRepository {
    fn read(&self, path: &Path) -> Result<Tree, LayerFileError> {
        if !path.exists() {
            return Err(LayerFileError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| LayerFileError::AccessError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if content.trim().is_empty() {
            return Ok(Tree::new());
        }

        let value: serde_json::Value =
            serde_yaml_ng::from_str(&content).map_err(|e| LayerFileError::Corrupted {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        match value {
            serde_json::Value::Object(map) => Ok(Tree::from_map(map)),
            serde_json::Value::Null => Ok(Tree::new()),
            other => Err(LayerFileError::Corrupted {
                path: path.to_path_buf(),
                message: format!("expected a mapping at top level, found {}", kind_of(&other)),
            }),
        }
    }

    fn write(&self, path: &Path, tree: &Tree) -> Result<(), LayerFileError> {
        let access = |e: std::io::Error| LayerFileError::AccessError {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(access)?;
        }

        let content =
            serde_yaml_ng::to_string(tree).map_err(|e| LayerFileError::SerializationError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let lock_file = fs::File::create(Self::lock_path(path)).map_err(access)?;
        lock_file.lock_exclusive().map_err(access)?;

        let result = Self::write_atomic(path, &content);

        let _ = lock_file.unlock();
        result
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn remove(&self, path: &Path) -> Result<bool, LayerFileError> {
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(path).map_err(|e| LayerFileError::AccessError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let _ = fs::remove_file(Self::lock_path(path));
        Ok(true)
    }
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a sequence",
        serde_json::Value::Object(_) => "a mapping",
    }
}
