use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use dirs::config_dir;
use hamster_notes_dbus::TrackerConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SETTING: &str = "default";

/// User-level configuration loaded from `~/.config/hamster-notes/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    /// Free-form plugin setting, stored verbatim.
    #[serde(default = "default_setting")]
    pub my_setting: String,
    /// Where to reach the Hamster daemon.
    #[serde(default)]
    pub tracker: TrackerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            my_setting: default_setting(),
            tracker: TrackerConfig::default(),
        }
    }
}

fn default_setting() -> String {
    DEFAULT_SETTING.to_string()
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
/// Keys absent from the file take their default values.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("hamster-notes").join("config.toml"))
}

/// Write the config to the default path unless a file is already there.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    let path = default_path()?;
    if path.exists() {
        return Ok(path);
    }
    save_to_path(config, &path)?;
    Ok(path)
}

/// Overwrite the default config file with `config`.
pub fn save(config: &Config) -> Result<PathBuf> {
    let path = default_path()?;
    save_to_path(config, &path)?;
    Ok(path)
}

/// Write `config` to `path`, creating parent directories as needed.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(())
}
