//! TOML configuration for the shell environment.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UeshError};
use crate::kind::EditorKind;

/// Default autosave interval.
pub const DEFAULT_AUTOSAVE_SECS: u64 = 60;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UeshConfig {
    /// Host name shown in the prompt.
    pub hostname: String,
    /// The user the interactive session runs as.
    pub user: UserConfig,
    /// When set, commands flagged `NoMaintenance` refuse to run.
    pub maintenance_mode: bool,
    /// Per-editor settings.
    pub editor: EditorConfigs,
}

impl Default for UeshConfig {
    fn default() -> Self {
        Self {
            hostname: "kernel".to_string(),
            user: UserConfig::default(),
            maintenance_mode: false,
            editor: EditorConfigs::default(),
        }
    }
}

/// Identity of the interactive user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub name: String,
    pub admin: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: "root".to_string(),
            admin: true,
        }
    }
}

/// Settings for each editor kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfigs {
    pub text: EditorSettings,
    pub json: EditorSettings,
    pub hex: EditorSettings,
}

impl EditorConfigs {
    pub fn for_kind(&self, kind: EditorKind) -> &EditorSettings {
        match kind {
            EditorKind::Text => &self.text,
            EditorKind::Json => &self.json,
            EditorKind::Hex => &self.hex,
        }
    }
}

/// Autosave and serialization settings for one editor kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub autosave: bool,
    pub autosave_interval_secs: u64,
    /// JSON only: indented (true) or compact (false) output.
    pub indented: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            autosave: true,
            autosave_interval_secs: DEFAULT_AUTOSAVE_SECS,
            indented: true,
        }
    }
}

impl EditorSettings {
    /// The autosave interval as a `Duration` (never zero).
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }
}

impl UeshConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        if config.hostname.trim().is_empty() {
            return Err(UeshError::Config("hostname must not be empty".to_string()));
        }
        if config.user.name.trim().is_empty() {
            return Err(UeshError::Config("user.name must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Load a configuration file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}
