//! Settings loading

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use crate::error::{TesseraError, TesseraResult};

use super::types::Settings;

const PROJECT_SETTINGS: &str = ".tessera/config.toml";
const USER_SETTINGS: &str = "tessera/config.toml";

/// Unknown key found while reading a settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

/// Load settings and collect non-fatal warnings (unknown keys).
pub fn load_with_warnings(path: &Path) -> TesseraResult<(Settings, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let settings: Settings = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| TesseraError::InvalidSettings {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .rsplit('.')
                .next()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
                key,
                file: path.to_path_buf(),
            }
        })
        .collect::<Vec<_>>();

    for w in &warnings {
        warn!(key = %w.key, file = %w.file.display(), "unknown settings key");
    }

    Ok((settings, warnings))
}

/// Project settings, else user settings, else defaults; env overrides last.
///
/// Unreadable or invalid files are skipped with a warning.
pub fn load_or_default(project_root: Option<&Path>) -> Settings {
    let candidates = project_root
        .map(|root| root.join(PROJECT_SETTINGS))
        .into_iter()
        .chain(dirs::config_dir().map(|d| d.join(USER_SETTINGS)));

    for path in candidates {
        if !path.exists() {
            continue;
        }
        match Settings::load(&path) {
            Ok(settings) => {
                debug!(path = %path.display(), "settings loaded");
                return with_env_overrides(settings);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping invalid settings"),
        }
    }

    with_env_overrides(Settings::default())
}

/// Like [`load_or_default`], but an explicitly named file must load.
pub fn resolve(explicit: Option<&Path>, project_root: Option<&Path>) -> anyhow::Result<Settings> {
    match explicit {
        Some(path) => {
            let settings = Settings::load(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?;
            Ok(with_env_overrides(settings))
        }
        None => Ok(load_or_default(project_root)),
    }
}

/// Apply `TESSERA_*` environment overrides.
pub fn with_env_overrides(settings: Settings) -> Settings {
    with_overrides_from(settings, |name| std::env::var(name).ok())
}

pub(crate) fn with_overrides_from<F>(mut settings: Settings, var: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = var("TESSERA_CONFIG_DIR") {
        settings.paths.config_dir = PathBuf::from(dir);
    }
    if let Some(dir) = var("TESSERA_ACCOUNTS_DIR") {
        settings.paths.accounts_dir = Some(PathBuf::from(dir));
    }

    if let Some(raw) = var("TESSERA_RETRY_MAX_ATTEMPTS") {
        match raw.trim().parse() {
            Ok(n) => settings.retry.max_attempts = n,
            Err(_) => warn!(value = %raw, "ignoring invalid TESSERA_RETRY_MAX_ATTEMPTS"),
        }
    }
    if let Some(raw) = var("TESSERA_RETRY_DELAY_MS") {
        match raw.trim().parse() {
            Ok(n) => settings.retry.delay_ms = n,
            Err(_) => warn!(value = %raw, "ignoring invalid TESSERA_RETRY_DELAY_MS"),
        }
    }

    if let Some(val) = var("TESSERA_TEMPLATES") {
        settings.templates.enabled = is_truthy(&val);
    }
    if let Some(val) = var("TESSERA_AUTO_CREATE") {
        settings.dispatch.auto_create_dependencies = is_truthy(&val);
    }

    settings
}

fn is_truthy(val: &str) -> bool {
    !matches!(val.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off")
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.contains(needle))
        .map(|i| i + 1)
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "paths",
        "config_dir",
        "accounts_dir",
        "local_file",
        "defaults_file",
        "retry",
        "max_attempts",
        "delay_ms",
        "templates",
        "enabled",
        "dispatch",
        "auto_create_dependencies",
    ];

    CANDIDATES
        .iter()
        .map(|c| (*c, levenshtein(unknown, c)))
        .min_by_key(|(_, dist)| *dist)
        .filter(|(_, dist)| *dist <= 2)
        .map(|(c, _)| c.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut prev: Vec<usize> = (0..=b.len()).collect();

    for (i, &ac) in a.iter().enumerate() {
        let mut curr = Vec::with_capacity(b.len() + 1);
        curr.push(i + 1);
        for (j, &bc) in b.iter().enumerate() {
            let cost = usize::from(ac != bc);
            curr.push((prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost));
        }
        prev = curr;
    }

    prev[b.len()]
}
