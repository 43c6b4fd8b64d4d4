//! Configuration stored in `.snapgram/config.toml`.
//!
//! Every section and key has a default, so an empty file (or none at all) is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Directory searched for in the working directory and its ancestors.
pub const CONFIG_DIR: &str = ".snapgram";
pub const CONFIG_FILE: &str = "config.toml";

/// Comments live in a fixed collection; the schema does not make it configurable.
pub const COMMENTS_COLLECTION: &str = "comments";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapgramConfig {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub collections: Collections,
    #[serde(default)]
    pub feed: FeedSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_backend_url")]
    pub url: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_database_id")]
    pub database_id: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            prefix: default_prefix(),
            database_id: default_database_id(),
        }
    }
}

fn default_backend_url() -> String {
    "${REDIS_URL}".to_string()
}

fn default_prefix() -> String {
    "snapgram".to_string()
}

fn default_database_id() -> String {
    "main".to_string()
}

/// Collection names for the configurable collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collections {
    #[serde(default = "default_users")]
    pub users: String,
    #[serde(default = "default_posts")]
    pub posts: String,
    #[serde(default = "default_saves")]
    pub saves: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            users: default_users(),
            posts: default_posts(),
            saves: default_saves(),
        }
    }
}

fn default_users() -> String {
    "users".to_string()
}

fn default_posts() -> String {
    "posts".to_string()
}

fn default_saves() -> String {
    "saves".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Page size of the infinite feed.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            recent_limit: default_recent_limit(),
        }
    }
}

fn default_page_size() -> u64 {
    9
}

fn default_recent_limit() -> u64 {
    20
}

impl SnapgramConfig {
    /// Parses a config file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|err| StoreError::Config {
            message: format!("failed to read {}: {err}", path.display()),
        })?;
        Self::from_toml(&content).map_err(|err| StoreError::Config {
            message: format!("failed to parse {}: {err}", path.display()),
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Looks for `.snapgram/config.toml` in `start` and each of its ancestors.
    pub fn discover(start: &Path) -> Result<Option<(PathBuf, Self)>, StoreError> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_DIR).join(CONFIG_FILE);
            if candidate.is_file() {
                let config = Self::load(&candidate)?;
                return Ok(Some((candidate, config)));
            }
            if !current.pop() {
                return Ok(None);
            }
        }
    }
}

impl BackendSettings {
    /// Backend URL with a `${VAR}` value expanded from the environment.
    pub fn resolved_url(&self) -> Result<String, StoreError> {
        let url = self.url.as_str();
        if let Some(var_name) = url.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            std::env::var(var_name).map_err(|_| StoreError::Config {
                message: format!("Environment variable {var_name} not set"),
            })
        } else {
            Ok(url.to_string())
        }
    }
}
