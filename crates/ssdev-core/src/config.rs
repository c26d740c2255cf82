use crate::error::Result;
use crate::github::DEFAULT_API_URL;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const API_URL_ENV: &str = "SSDEV_GITHUB_API_URL";
pub const CLONE_DIR_ENV: &str = "SSDEV_CLONE_DIR";

/// User-level settings from `~/.ssdev/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Token for the GitHub API. Needed for private security forks and to
    /// avoid the anonymous rate limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    /// Parent directory for `ssdev clone`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_dir: Option<PathBuf>,
    #[serde(default = "default_api_url")]
    pub github_api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            clone_dir: None,
            github_api_url: default_api_url(),
        }
    }
}

impl Config {
    /// Load the user config and apply environment overrides. A missing
    /// file is not an error.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_from(&paths::config_path()?)?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Override fields from environment variables; empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = get(TOKEN_ENV) {
            self.github_token = Some(token);
        }
        if let Some(url) = get(API_URL_ENV) {
            self.github_api_url = url;
        }
        if let Some(dir) = get(CLONE_DIR_ENV) {
            self.clone_dir = Some(PathBuf::from(dir));
        }
    }
}
