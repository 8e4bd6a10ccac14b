//! Settings Models
//!
//! Configuration data structures stored in `config.json`.

use serde::{Deserialize, Serialize};

use failscope_core::ProxyConfig;
use failscope_llm::ProviderConfig;

/// Shape of the analyzer's result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Text completion parsed into an enum-confidence diagnosis
    #[default]
    Legacy,
    /// Tool-call root cause analysis with a 0-100 confidence
    Structured,
}

/// Analyzer settings, immutable once the analyzer is built
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// GitHub REST API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API root, overridable for GitHub Enterprise
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Token used for artifact downloads (falls back to `GITHUB_TOKEN`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Repositories examined per search in batch discovery
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_search_limit() -> usize {
    10
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            search_limit: default_search_limit(),
        }
    }
}

/// Application configuration stored in config.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM provider used for analysis
    #[serde(default)]
    pub llm: ProviderConfig,
    #[serde(default)]
    pub analysis: AnalyzerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    /// Proxy for every outbound request unless the provider sets its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

impl AppConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.llm.validate()?;

        if url::Url::parse(&self.github.api_url).is_err() {
            return Err(format!("Invalid GitHub API URL: {}", self.github.api_url));
        }
        if self.github.search_limit == 0 || self.github.search_limit > 100 {
            return Err("github.search_limit must be between 1 and 100".to_string());
        }

        if let Some(proxy) = &self.proxy {
            proxy.validate()?;
        }

        Ok(())
    }

    /// Provider config with the global proxy applied when it has none
    pub fn effective_llm(&self) -> ProviderConfig {
        let mut llm = self.llm.clone();
        if llm.proxy.is_none() {
            llm.proxy = self.proxy.clone();
        }
        llm
    }
}
