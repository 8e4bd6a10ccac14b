//! Failscope
//!
//! AI-assisted root-cause diagnosis for failing test runs. This crate ties
//! the workspace together:
//! - Analyzer orchestration over a parsed report
//! - Discovery of report artifacts in GitHub Actions runs
//! - Configuration loading (`~/.failscope/config.json`)
//! - Error type and path utilities
//!
//! The report model, detector and discovery scan live in `failscope-reports`,
//! the diagnosis models, prompt and extractor in `failscope-analysis`, and the
//! providers in `failscope-llm`.

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::{AnalyzerConfig, AppConfig, GitHubConfig, OutputFormat};
pub use services::{create_provider, load_discovered_report, Analyzer, GitHubSource};
pub use storage::ConfigService;
pub use utils::error::{AppError, AppResult};

