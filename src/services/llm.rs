//! Provider Factory
//!
//! Builds the configured [`LlmProvider`] behind an `Arc<dyn _>`.

use std::sync::Arc;

use failscope_llm::{
    AnthropicProvider, LlmProvider, LlmResult, OllamaProvider, OpenAIProvider, ProviderConfig,
    ProviderType,
};

/// Create the provider named by `config`.
pub fn create_provider(config: &ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderType::Anthropic => Arc::new(AnthropicProvider::new(config.clone())?),
        ProviderType::OpenAI => Arc::new(OpenAIProvider::new(config.clone())?),
        ProviderType::Ollama => Arc::new(OllamaProvider::new(config.clone())?),
    };
    Ok(provider)
}
