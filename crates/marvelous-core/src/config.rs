use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use marvelous_api::{Credentials, MarvelClient, MAX_PAGE_LIMIT};
use serde::{Deserialize, Serialize};

use crate::error::MarvelousError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub page_limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load config: the user file if it exists, otherwise built-in defaults.
    pub fn load() -> Result<Self, MarvelousError> {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path, falling back to defaults when it is absent.
    pub fn load_from(path: &Path) -> Result<Self, MarvelousError> {
        let config = if path.exists() {
            let user_str = std::fs::read_to_string(path)?;
            toml::from_str(&user_str).map_err(|e| MarvelousError::Config(e.to_string()))?
        } else {
            toml::from_str(DEFAULT_CONFIG).map_err(|e| MarvelousError::Config(e.to_string()))?
        };
        Self::validate(config)
    }

    fn validate(config: AppConfig) -> Result<Self, MarvelousError> {
        if !(1..=MAX_PAGE_LIMIT).contains(&config.api.page_limit) {
            return Err(MarvelousError::Config(format!(
                "api.page_limit must be between 1 and {MAX_PAGE_LIMIT}, got {}",
                config.api.page_limit
            )));
        }
        Ok(config)
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), MarvelousError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), MarvelousError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MarvelousError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Catalog client for the configured base URL and credentials.
    pub fn catalog_client(&self) -> Result<MarvelClient, MarvelousError> {
        Ok(MarvelClient::new(self.credentials()).with_base_url(&self.api.base_url)?)
    }

    /// API keys: environment first, then whatever the config file holds.
    pub fn credentials(&self) -> Credentials {
        Credentials::from_env().or(Credentials {
            public_key: self.api.public_key.clone(),
            private_key: self.api.private_key.clone(),
        })
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Directory holding the persisted saved/viewed collections.
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|d| d.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "marvelous")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}
