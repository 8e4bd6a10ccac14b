//! Storage Layer
//!
//! Read-only access to the JSON configuration file.

pub mod config;

pub use config::ConfigService;
