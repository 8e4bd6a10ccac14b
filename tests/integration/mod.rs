//! Integration Tests Module
//!
//! End-to-end tests for the failscope pipeline: report parsing, discovery
//! over an in-memory artifact source, extraction, analysis and configuration.

// Shared fakes (scripted provider, in-memory artifact source)
mod support;

// Report parsing and detection across formats
mod report_parsing_test;

// Discovery through to a parsed report
mod discovery_test;

// Diagnosis extraction from realistic model output
mod extraction_test;

// Analyzer orchestration in both output formats
mod analyzer_test;

// Configuration file loading
mod config_test;
