//! Services
//!
//! - `analyzer` - Orchestrates prompt, model call and diagnosis extraction
//! - `discovery` - Loads the report of a discovered artifact
//! - `github` - GitHub REST implementation of the artifact source
//! - `llm` - Provider factory

pub mod analyzer;
pub mod discovery;
pub mod github;
pub mod llm;

pub use analyzer::Analyzer;
pub use discovery::{load_discovered_report, report_from_files};
pub use github::GitHubSource;
pub use llm::create_provider;
