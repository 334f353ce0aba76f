//! Configuration file support for quay.
//!
//! Two configuration file locations are recognized:
//! - Global: `~/.quay/config.toml` - User-wide defaults
//! - Project: `.quay/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Quay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vendor CLI settings
    pub sf: SfConfig,

    /// Install pipeline settings
    pub install: InstallConfig,

    /// Artifact packaging settings
    pub pack: PackConfig,
}

/// Settings for locating and driving the vendor `sf` CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SfConfig {
    /// Path to the `sf` binary (overrides PATH lookup)
    pub binary: Option<PathBuf>,
}

/// Install pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Org alias used when `--org` is not given
    pub default_org: Option<String>,

    /// Minutes to wait for a single package install before timing out
    pub wait_mins: Option<u64>,

    /// Seconds between install status polls
    pub poll_secs: Option<u64>,
}

/// Artifact packaging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Output directory for artifacts (default `.quay/artifacts`)
    pub out_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory: {}", parent.display())
            })?;
        }

        let contents =
            toml::to_string_pretty(self).context("failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.sf.binary.is_some() {
            self.sf.binary = other.sf.binary;
        }
        if other.install.default_org.is_some() {
            self.install.default_org = other.install.default_org;
        }
        if other.install.wait_mins.is_some() {
            self.install.wait_mins = other.install.wait_mins;
        }
        if other.install.poll_secs.is_some() {
            self.install.poll_secs = other.install.poll_secs;
        }
        if other.pack.out_dir.is_some() {
            self.pack.out_dir = other.pack.out_dir;
        }
    }

    /// Minutes to wait for a single install, with the built-in default.
    pub fn wait_mins(&self) -> u64 {
        self.install.wait_mins.unwrap_or(30)
    }

    /// Seconds between status polls, with the built-in default.
    pub fn poll_secs(&self) -> u64 {
        self.install.poll_secs.unwrap_or(30)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.quay/config.toml)
/// 2. Global config (~/.quay/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global quay config directory (~/.quay).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".quay"))
}

/// Get the global config path (~/.quay/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.quay/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".quay").join("config.toml")
}
