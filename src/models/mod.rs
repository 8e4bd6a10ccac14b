//! Data Models

pub mod settings;

pub use settings::{AnalyzerConfig, AppConfig, GitHubConfig, OutputFormat};
