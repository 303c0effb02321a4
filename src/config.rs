// Application configuration loaded from YAML

use crate::kv::DEFAULT_PREFIX;
use crate::tasks::DEFAULT_UPCOMING_DAYS;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_FILE: &str = "config.yml";
const APP_DIR: &str = "lifehub";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the durable store
    pub data_dir: PathBuf,
    /// Namespace prepended to every storage key
    pub key_prefix: String,
    /// Look-ahead window for upcoming tasks
    pub upcoming_days: u32,
    /// trace, debug, info, warn or error
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR),
            key_prefix: DEFAULT_PREFIX.to_string(),
            upcoming_days: DEFAULT_UPCOMING_DAYS,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the per-user config file when present, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.check()?;

        debug!(path = ?path, "Loaded config");
        Ok(config)
    }

    /// `<config dir>/lifehub/config.yml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.log_level
            .parse()
            .map_err(|_| eyre!("Invalid log level: {}", self.log_level))
    }

    fn check(&self) -> Result<()> {
        if self.key_prefix.is_empty() {
            return Err(eyre!("key_prefix cannot be empty"));
        }
        self.log_level()?;
        Ok(())
    }
}
