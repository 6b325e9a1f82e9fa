//! Account configuration
//!
//! The standard four-layer stack used by tooling that manages named
//! accounts, highest priority first:
//!
//! | layer     | writable | sectioned | file                         |
//! |-----------|----------|-----------|------------------------------|
//! | `runtime` | yes      | no        | none                         |
//! | `account` | yes      | yes       | `<accounts_dir>/<name>`      |
//! | `local`   | yes      | yes       | `<config_dir>/config.yaml`   |
//! | `default` | no       | no        | optional defaults file       |
//!
//! `account_exclusive` keys may only be written to `runtime` and `account`.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::domain::entities::{ConfigLayer, Tree};
use crate::domain::ports::LayerRepository;
use crate::domain::services::{
    BraceExpander, LayerStack, MetadataPolicy, SharedConfig, SharedMetadata,
};
use crate::domain::value_objects::KeyPath;
use crate::error::{TesseraError, TesseraResult};
use crate::infrastructure::repositories::YamlLayerRepository;
use crate::settings::Settings;

pub const RUNTIME_LAYER: &str = "runtime";
pub const ACCOUNT_LAYER: &str = "account";
pub const LOCAL_LAYER: &str = "local";
pub const DEFAULT_LAYER: &str = "default";

const ACCOUNT_NAME_KEY: &str = "account#name";

pub struct AccountConfig {
    config: SharedConfig,
    metadata: SharedMetadata,
    repository: Arc<dyn LayerRepository>,
    accounts_dir: PathBuf,
}

impl AccountConfig {
    pub fn new(settings: &Settings, metadata: SharedMetadata) -> TesseraResult<Self> {
        Self::with_repository(settings, metadata, Arc::new(YamlLayerRepository::new()))
    }

    pub fn with_repository(
        settings: &Settings,
        metadata: SharedMetadata,
        repository: Arc<dyn LayerRepository>,
    ) -> TesseraResult<Self> {
        let expand = settings.templates.enabled;
        let with_templates = |layer: ConfigLayer| {
            if expand {
                layer.expand_templates()
            } else {
                layer
            }
        };

        let mut default = ConfigLayer::new(DEFAULT_LAYER).loadable();
        if let Some(path) = settings.paths.defaults_file() {
            default = default.with_filename(path);
        }

        let layers = vec![
            with_templates(ConfigLayer::new(RUNTIME_LAYER).writable()),
            with_templates(
                ConfigLayer::new(ACCOUNT_LAYER)
                    .writable()
                    .sectioned()
                    .loadable()
                    .savable()
                    .filename_mutable(),
            ),
            with_templates(
                ConfigLayer::new(LOCAL_LAYER)
                    .writable()
                    .sectioned()
                    .loadable()
                    .savable()
                    .with_filename(settings.paths.local_file()),
            ),
            with_templates(default),
        ];

        let policy = MetadataPolicy::new(Arc::clone(&metadata))
            .with_exclusive_layers([RUNTIME_LAYER, ACCOUNT_LAYER]);
        let stack = LayerStack::from_layers(layers)?
            .with_policy(Arc::new(policy))
            .with_expander(Arc::new(BraceExpander))
            .with_repository(Arc::clone(&repository));

        Ok(Self {
            config: stack.into_shared(),
            metadata,
            repository,
            accounts_dir: settings.paths.accounts_dir(),
        })
    }

    /// Shared stack, ready to hand to a dispatcher.
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn accounts_dir(&self) -> &PathBuf {
        &self.accounts_dir
    }

    pub fn account_path(&self, name: &str) -> PathBuf {
        self.accounts_dir.join(name)
    }

    fn read(&self) -> RwLockReadGuard<'_, LayerStack> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LayerStack> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the `local` and `default` layers when their files exist.
    pub fn load_base(&self) -> TesseraResult<()> {
        let mut stack = self.write();
        for name in [LOCAL_LAYER, DEFAULT_LAYER] {
            let present = stack
                .layer(name)?
                .filename()
                .is_some_and(|path| self.repository.exists(path));
            if present {
                stack.load(name)?;
            }
        }
        Ok(())
    }

    /// Start a fresh, unsaved account.
    pub fn ac_new(&self, name: &str) -> TesseraResult<()> {
        let mut stack = self.write();
        let values = Tree::from_value(json!({ "account": { "name": name } }));
        stack.replace_values(ACCOUNT_LAYER, values)?;
        stack.set_filename(ACCOUNT_LAYER, self.account_path(name))?;
        debug!(account = name, "new account started");
        Ok(())
    }

    pub fn ac_load(&self, name: &str) -> TesseraResult<()> {
        let path = self.account_path(name);
        if !self.repository.exists(&path) {
            return Err(TesseraError::AccountNotFound {
                name: name.to_string(),
                path,
            });
        }
        let mut stack = self.write();
        stack.set_filename(ACCOUNT_LAYER, path)?;
        stack.load(ACCOUNT_LAYER)?;
        info!(account = name, "account loaded");
        Ok(())
    }

    /// Save the account layer once every required key is set somewhere.
    pub fn ac_save(&self) -> TesseraResult<()> {
        let missing = self.missing_required()?;
        if !missing.is_empty() {
            return Err(TesseraError::AccountNotReady { missing });
        }
        let mut stack = self.write();
        stack.save(ACCOUNT_LAYER)?;
        info!(account = ?self.current_in(&stack), "account saved");
        Ok(())
    }

    /// Required setup keys no layer holds, as `section#key`.
    pub fn missing_required(&self) -> TesseraResult<Vec<String>> {
        let required: Vec<(String, String)> = {
            let metadata = self.metadata.read().unwrap_or_else(PoisonError::into_inner);
            metadata
                .sections()
                .into_iter()
                .flat_map(|section| {
                    metadata
                        .keys_in(&section)
                        .into_iter()
                        .map(move |key| (section.clone(), key))
                })
                .filter(|(section, key)| {
                    metadata
                        .attribute(section, key)
                        .is_some_and(|meta| meta.setup.required)
                })
                .collect()
        };

        let stack = self.read();
        let mut missing = Vec::new();
        for (section, key) in required {
            let path = KeyPath::new([key.as_str()])?.with_section(section);
            if stack.where_is(&path)?.is_empty() {
                missing.push(path.to_string());
            }
        }
        Ok(missing)
    }

    /// Delete the account file and empty the account layer.
    ///
    /// `false` when no account file was attached or it did not exist.
    pub fn ac_erase(&self) -> TesseraResult<bool> {
        let mut stack = self.write();
        let path = stack.layer(ACCOUNT_LAYER)?.filename().map(PathBuf::from);
        stack.clear(ACCOUNT_LAYER)?;
        let Some(path) = path else {
            return Ok(false);
        };
        if !self.repository.remove(&path)? {
            return Ok(false);
        }
        info!(path = %path.display(), "account erased");
        Ok(true)
    }

    pub fn current_account(&self) -> Option<String> {
        self.current_in(&self.read())
    }

    fn current_in(&self, stack: &LayerStack) -> Option<String> {
        match stack.get_in(ACCOUNT_LAYER, ACCOUNT_NAME_KEY).ok()?? {
            Value::String(name) => Some(name),
            _ => None,
        }
    }
}
