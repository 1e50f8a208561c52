//! Configuration resolution for claro-rights.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/claro-rights/settings.json)
//! 3. Project config (.claro-rights/settings.json)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::repository::RightsInheritance;
use crate::requester::{USURPATE_WORKSPACE_ROLE, WORKSPACE_MANAGER_PREFIX};

/// Complete claro-rights configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub voter: VoterConfig,
    #[serde(default)]
    pub rights: RightsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Override rules applied by the resource voter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoterConfig {
    /// Prefix of workspace manager roles; the workspace guid follows it.
    pub manager_role_prefix: String,
    /// Role marking a requester impersonating a workspace role.
    pub usurpation_role: String,
    /// Let the creator of every node in a batch bypass mask checks.
    pub creator_override: bool,
}

impl Default for VoterConfig {
    fn default() -> Self {
        Self {
            manager_role_prefix: WORKSPACE_MANAGER_PREFIX.to_string(),
            usurpation_role: USURPATE_WORKSPACE_ROLE.to_string(),
            creator_override: true,
        }
    }
}

/// Rights lookup configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RightsConfig {
    #[serde(default)]
    pub inheritance: RightsInheritance,
}

/// Rights database location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub database_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

/// Load configuration with hierarchical resolution.
///
/// Files are merged key by key: a later file only replaces the settings it
/// names.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let mut layers = Vec::new();
    if let Some(global_path) = global_config_path() {
        layers.push(global_path);
    }
    if let Some(dir) = project_dir {
        layers.push(dir.join(".claro-rights").join("settings.json"));
    }

    let mut config = layered_config(&layers)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        .map(|p| p.join("claro-rights").join("settings.json"))
}

/// Defaults overlaid with every existing file of `paths`, in order.
fn layered_config(paths: &[PathBuf]) -> Result<Config> {
    let mut merged = serde_json::to_value(Config::default())?;
    for path in paths.iter().filter(|path| path.exists()) {
        merge_value(&mut merged, load_config_file(path)?);
    }
    serde_json::from_value(merged)
        .map_err(|e| Error::Config(format!("Failed to resolve configuration: {e}")))
}

fn load_config_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    // reject unknown values here so the error names the file
    Config::deserialize(&value).map_err(|e| {
        Error::Config(format!("Invalid config file {}: {}", path.display(), e))
    })?;
    Ok(value)
}

/// Overlay `overlay` onto `base`. Objects merge per key; `null` keeps the
/// base value.
fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (slot, value) => *slot = value,
    }
}

fn apply_env_overrides(
    config: &mut Config,
    var: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(val) = var("CLARO_RIGHTS_DATABASE") {
        config.store.database_path = Some(PathBuf::from(val));
    }
    if let Some(val) = var("CLARO_RIGHTS_LOG_LEVEL") {
        config.log.level = val;
    }
    if let Some(val) = var("CLARO_RIGHTS_INHERITANCE") {
        config.rights.inheritance = val.parse()?;
    }
    Ok(())
}
