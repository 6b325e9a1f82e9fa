//! Library settings
//!
//! Resolution order:
//! 1. Explicit settings file
//! 2. Environment variables (TESSERA_*) on top of whichever file was used
//! 3. Project settings (.tessera/config.toml)
//! 4. User settings (~/.config/tessera/config.toml)
//! 5. Built-in defaults

mod loader;
mod types;

pub use loader::{load_or_default, resolve, with_env_overrides, ConfigWarning};
pub use types::{DispatchSettings, PathSettings, RetrySettings, Settings, TemplateSettings};
