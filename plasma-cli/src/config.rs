//! CLI configuration.
//!
//! Resolved in order: built-in defaults, `~/.plasma/config.toml` (or `--config`),
//! then `PLASMA_TREE_DEPTH` / `PLASMA_LOG` from the environment. A `--depth`
//! flag on the command line wins over all of them.

use anyhow::{Context, Result};
use plasma_merkle::{DefaultNodes, DEFAULT_TREE_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sparse Merkle tree depth
    pub depth: usize,

    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            depth: DEFAULT_TREE_DEPTH,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".plasma").join("config.toml"))
    }

    /// Load configuration. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(depth) = std::env::var("PLASMA_TREE_DEPTH") {
            self.depth = depth
                .parse()
                .with_context(|| format!("Invalid PLASMA_TREE_DEPTH: {}", depth))?;
        }
        if let Ok(level) = std::env::var("PLASMA_LOG") {
            self.log_level = level;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        DefaultNodes::for_depth(self.depth)?;
        Ok(())
    }
}
