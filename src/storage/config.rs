//! JSON Configuration Loading
//!
//! Reads `config.json`, fills secrets from the environment, and validates.
//! The resulting configuration is immutable; nothing is written back.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::config_path;

/// Environment variable consulted for the GitHub token
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Configuration service holding the loaded settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load and validate the configuration at `path`.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let config = Self::load_from_file(path)?;
        Ok(Self {
            config_path: path.to_path_buf(),
            config,
        })
    }

    /// Load `~/.failscope/config.json`, or defaults when it does not exist.
    pub fn load_or_default() -> AppResult<Self> {
        let path = config_path()?;
        if path.exists() {
            return Self::load(path);
        }

        debug!(path = %path.display(), "config file not found, using defaults");
        let mut config = AppConfig::default();
        resolve_environment(&mut config);
        config.validate().map_err(AppError::validation)?;
        Ok(Self {
            config_path: path,
            config,
        })
    }

    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&content)?;
        resolve_environment(&mut config);
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Path the configuration was (or would have been) read from
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Take ownership of the configuration
    pub fn into_config(self) -> AppConfig {
        self.config
    }
}

/// Fill values the file left empty: API key and GitHub token from the
/// environment, model from the provider default.
fn resolve_environment(config: &mut AppConfig) {
    if config.llm.api_key.is_none() {
        config.llm.api_key = config.llm.resolved_api_key();
    }
    if config.llm.model.trim().is_empty() {
        config.llm.model = config.llm.provider.default_model().to_string();
    }
    if config.github.token.is_none() {
        config.github.token = std::env::var(GITHUB_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty());
    }
}
