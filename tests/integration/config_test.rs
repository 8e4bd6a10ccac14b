//! Configuration Integration Tests
//!
//! Loads config files from disk and builds an analyzer from them.

use std::io::Write;

use tempfile::NamedTempFile;

use failscope::{Analyzer, AppError, ConfigService, OutputFormat};
use failscope_llm::ProviderType;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_full_config_builds_analyzer() {
    let file = config_file(
        r#"{
  "llm": {
    "provider": "ollama",
    "model": "qwen2.5-coder",
    "base_url": "http://localhost:11434",
    "temperature": 0.1
  },
  "analysis": {"output_format": "structured"},
  "github": {"api_url": "https://ghe.example.com/api/v3", "token": "ghp_abc", "search_limit": 25}
}"#,
    );

    let config = ConfigService::load(file.path()).unwrap().into_config();
    assert_eq!(config.llm.provider, ProviderType::Ollama);
    assert_eq!(config.github.search_limit, 25);

    let analyzer = Analyzer::from_app_config(&config).unwrap();
    assert_eq!(analyzer.config().output_format, OutputFormat::Structured);
    assert_eq!(analyzer.provider().name(), "ollama");
    assert_eq!(analyzer.provider().model(), "qwen2.5-coder");
}

#[test]
fn test_proxy_section_is_validated() {
    let file = config_file(
        r#"{"llm": {"provider": "ollama"}, "proxy": {"protocol": "socks5", "host": "", "port": 1080}}"#,
    );
    let err = ConfigService::load(file.path()).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn test_unknown_provider_is_rejected() {
    let file = config_file(r#"{"llm": {"provider": "mystery"}}"#);
    let err = ConfigService::load(file.path()).unwrap_err();
    assert!(matches!(err, AppError::Serialization(_)));
}
