//! Settings type definitions

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TesseraResult;

use super::loader::{self, ConfigWarning};

const APP_DIR: &str = "tessera";

/// Where account, local and default layer files live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Defaults to `<config_dir>/accounts`
    #[serde(default)]
    pub accounts_dir: Option<PathBuf>,

    /// Defaults to `<config_dir>/config.yaml`
    #[serde(default)]
    pub local_file: Option<PathBuf>,

    /// Application defaults; no default layer file when unset
    #[serde(default)]
    pub defaults_file: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            accounts_dir: None,
            local_file: None,
            defaults_file: None,
        }
    }
}

impl PathSettings {
    pub fn accounts_dir(&self) -> PathBuf {
        self.accounts_dir
            .clone()
            .unwrap_or_else(|| self.config_dir.join("accounts"))
    }

    pub fn local_file(&self) -> PathBuf {
        self.local_file
            .clone()
            .unwrap_or_else(|| self.config_dir.join("config.yaml"))
    }

    pub fn defaults_file(&self) -> Option<&Path> {
        self.defaults_file.as_deref()
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".tessera"))
}

/// Bounded retry used by process handlers around flaky controller calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_delay_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSettings {
    /// Expand `{{ key }}` references in the runtime and account layers
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Create missing required object dependencies on the fly
    #[serde(default = "default_true")]
    pub auto_create_dependencies: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            auto_create_dependencies: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Library settings, read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub templates: TemplateSettings,

    #[serde(default)]
    pub dispatch: DispatchSettings,
}

impl Settings {
    /// Load from a TOML file, ignoring unknown keys.
    pub fn load(path: &Path) -> TesseraResult<Self> {
        let (settings, _warnings) = loader::load_with_warnings(path)?;
        Ok(settings)
    }

    pub fn load_with_warnings(path: &Path) -> TesseraResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }
}
