//! Configuration Management
//!
//! Handles persistent configuration storage for rescoll.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable holding extra description directories (path list)
pub const DATA_DIRS_ENV: &str = "RESCOLL_DATA_DIRS";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Directories searched for `<service>-<version>.json` descriptions
    #[serde(default)]
    pub data_dirs: Vec<PathBuf>,
    /// Pinned API version per service
    #[serde(default)]
    pub api_versions: HashMap<String, String>,
    /// Endpoint URL per service
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
    /// Bearer token sent to every endpoint
    #[serde(default)]
    pub token: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rescoll").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file. Missing or unreadable files
    /// give the default configuration.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Search directories in precedence order: configured directories, then
    /// those from `RESCOLL_DATA_DIRS` (searched last, so they win)
    pub fn effective_data_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.data_dirs.clone();
        if let Some(paths) = std::env::var_os(DATA_DIRS_ENV) {
            dirs.extend(std::env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }
        dirs
    }

    /// Get effective endpoint (CLI > config)
    pub fn effective_endpoint(&self, service: &str, cli: Option<&str>) -> Option<String> {
        cli.map(|s| s.to_string())
            .or_else(|| self.endpoints.get(service).cloned())
    }

    /// Set a service endpoint and save
    pub fn set_endpoint(&mut self, service: &str, endpoint: &str) -> Result<()> {
        self.endpoints
            .insert(service.to_string(), endpoint.to_string());
        self.save()
    }
}
