//! Failscope LLM
//!
//! Provides a unified interface for the LLM providers the analyzer can use:
//! - Anthropic Claude
//! - OpenAI (and OpenAI-compatible gateways)
//! - Ollama (local inference)
//!
//! Also includes the HTTP client factory shared by every provider.

pub mod anthropic;
pub mod http_client;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use anthropic::AnthropicProvider;
pub use http_client::build_http_client;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;
