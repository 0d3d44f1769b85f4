//! Configuration loading and management.
//!
//! Resolution order, first hit wins:
//! 1. Explicit path (`--config` or `TASK_TREE_CONFIG_PATH`)
//! 2. `./.task-tree/config.yaml`
//! 3. `~/.task-tree/config.yaml`
//! 4. Built-in defaults
//!
//! Environment overrides are applied on top:
//! - `TASK_TREE_DB_PATH` - Database path
//! - `TASK_TREE_MAX_DEPTH` - Maximum nesting depth for new subtasks

use crate::tree::{DEFAULT_MAX_DEPTH, DepthPolicy};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_PATH_ENV: &str = "TASK_TREE_CONFIG_PATH";
pub const DB_PATH_ENV: &str = "TASK_TREE_DB_PATH";
pub const MAX_DEPTH_ENV: &str = "TASK_TREE_MAX_DEPTH";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub tree: TreeConfig,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".task-tree/tasks.db")
}

/// Tree settings. Applies to every record in the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Deepest level a new subtask may occupy; the root record is level 0.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration from an explicit path, the standard locations
    /// or defaults, then apply environment overrides.
    ///
    /// An explicit path that fails to load is an error; the standard
    /// locations are skipped when absent.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::load(&path)?,
            None => Self::search_paths()
                .into_iter()
                .find(|p| p.is_file())
                .map(|p| {
                    debug!(path = %p.display(), "Loading config");
                    Self::load(&p)
                })
                .transpose()?
                .unwrap_or_default(),
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Standard config file locations, highest priority first.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".task-tree/config.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".task-tree").join("config.yaml"));
        }
        paths
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(db_path) = std::env::var(DB_PATH_ENV) {
            self.store.db_path = PathBuf::from(db_path);
        }

        if let Ok(depth) = std::env::var(MAX_DEPTH_ENV) {
            match depth.parse() {
                Ok(depth) => self.tree.max_depth = depth,
                Err(_) => bail!("{} must be a positive integer, got {:?}", MAX_DEPTH_ENV, depth),
            }
        }

        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.tree.max_depth == 0 {
            bail!("tree.max_depth must be at least 1");
        }
        Ok(())
    }

    pub fn depth_policy(&self) -> DepthPolicy {
        DepthPolicy::new(self.tree.max_depth)
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.store.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
