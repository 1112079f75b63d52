//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/ordtree/ordtree.toml`
//! 3. Local config: a TOML file passed to [`Settings::load`]
//! 4. Environment variables: `ORDTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::{TreeError, TreeResult};

/// Build settings consumed by [`crate::TreeBuilder::from_settings`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Deepest input nesting accepted at construction, counted in levels
    pub max_depth: usize,
    /// Arena slots preallocated per tree (0 = grow on demand)
    pub capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_depth: 512,
            capacity: 0,
        }
    }
}

/// Raw settings for intermediate parsing (`None` = not specified, inherit from base).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub max_depth: Option<usize>,
    pub capacity: Option<usize>,
}

/// Get the XDG config directory for ordtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ordtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("ordtree.toml"))
}

fn config_err(e: ConfigError) -> TreeError {
    TreeError::Config {
        message: e.to_string(),
    }
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> TreeResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| TreeError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| TreeError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            max_depth: overlay.max_depth.unwrap_or(self.max_depth),
            capacity: overlay.capacity.unwrap_or(self.capacity),
        }
    }

    fn validate(self) -> TreeResult<Self> {
        if self.max_depth == 0 {
            return Err(TreeError::Config {
                message: "max_depth must be at least 1".to_string(),
            });
        }
        Ok(self)
    }

    /// Load settings with layered precedence.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/ordtree/ordtree.toml`
    /// 3. Local config: `local`, if given and present
    /// 4. Environment variables: `ORDTREE_MAX_DEPTH`, `ORDTREE_CAPACITY`
    #[instrument(level = "debug")]
    pub fn load(local: Option<&Path>) -> TreeResult<Self> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(local_path) = local {
            if local_path.exists() {
                let raw = load_raw_settings(local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        debug!(?current, "settings loaded");
        current.validate()
    }

    /// Defaults overlaid with a single file; ignores global config and environment.
    #[instrument(level = "debug")]
    pub fn load_file(path: &Path) -> TreeResult<Self> {
        let raw = load_raw_settings(path)?;
        Self::default().merge_with(&raw).validate()
    }

    /// Apply ORDTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> TreeResult<Self> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("ORDTREE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value(&config, "max_depth")? {
            settings.max_depth = val;
        }
        if let Some(val) = env_value(&config, "capacity")? {
            settings.capacity = val;
        }

        Ok(settings)
    }
}

/// A missing key is `None`; a present but malformed one is an error.
fn env_value(config: &Config, key: &str) -> TreeResult<Option<usize>> {
    match config.get::<usize>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(TreeError::Config {
            message: format!("environment override {}: {}", key, e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_with_keeps_unspecified_values() {
        let base = Settings::default();
        let overlay = RawSettings {
            max_depth: None,
            capacity: Some(64),
        };
        let merged = base.merge_with(&overlay);
        assert_eq!(merged.max_depth, 512);
        assert_eq!(merged.capacity, 64);
    }

    #[test]
    fn test_validate_rejects_zero_depth() {
        let settings = Settings {
            max_depth: 0,
            capacity: 0,
        };
        assert!(matches!(settings.validate(), Err(TreeError::Config { .. })));
    }
}
