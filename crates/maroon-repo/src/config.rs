use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RepoError, RepoResult};

/// Environment variable overriding [`RepoConfig::repos_root`].
pub const REPOS_ENV: &str = "MAROON_REPOS";

/// Settings shared by every repository a [`RepoManager`] touches.
///
/// [`RepoManager`]: crate::RepoManager
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Directory holding all per-file repositories.
    pub repos_root: PathBuf,
    /// zlib level (0-9) for objects and the index.
    pub compression_level: u32,
    /// Fsync every object, index and key write before renaming it in.
    pub sync_writes: bool,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            repos_root: PathBuf::from("repos"),
            compression_level: maroon_store::codec::DEFAULT_LEVEL,
            sync_writes: false,
        }
    }
}

impl RepoConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> RepoResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| RepoError::Config(e.to_string()))?;
        if config.compression_level > 9 {
            return Err(RepoError::Config(format!(
                "compression_level must be 0-9, got {}",
                config.compression_level
            )));
        }
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: &Path) -> RepoResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| RepoError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Defaults, then the file if given, then the environment.
    pub fn load(path: Option<&Path>) -> RepoResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.apply_env(|key| std::env::var(key).ok()))
    }

    /// Overlay environment overrides read through `lookup`.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(root) = lookup(REPOS_ENV).filter(|v| !v.is_empty()) {
            self.repos_root = PathBuf::from(root);
        }
        self
    }

    pub fn with_repos_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.repos_root = root.into();
        self
    }
}
