//! Ollama Provider
//!
//! Implementation of the LlmProvider trait for Ollama local inference
//! using the ollama-rs native SDK. No API key is required.

use async_trait::async_trait;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::chat::{ChatMessage, ChatMessageResponse, MessageRole as OllamaRole};
use ollama_rs::generation::tools::{ToolCallFunction, ToolFunctionInfo, ToolInfo, ToolType};
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;
use tracing::{debug, warn};

use failscope_core::ProxyConfig;

use crate::http_client::build_http_client;
use crate::provider::LlmProvider;
use crate::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageContent, MessageRole,
    ProviderConfig, StopReason, ToolCall, ToolDefinition, UsageStats,
};

/// Default Ollama API endpoint
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Default Ollama port when the base URL omits one
const OLLAMA_DEFAULT_PORT: u16 = 11434;

/// Ollama provider for local inference using the native ollama-rs SDK
pub struct OllamaProvider {
    config: ProviderConfig,
    client: Ollama,
}

impl OllamaProvider {
    /// Create a new Ollama provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let base_url = config.base_url.as_deref().unwrap_or(OLLAMA_DEFAULT_URL);
        let client = Self::create_client(base_url, config.proxy.as_ref())?;
        Ok(Self { config, client })
    }

    /// Create an Ollama SDK client from a base URL string.
    ///
    /// `Ollama::new()` takes host and port separately, so the URL is split.
    fn create_client(base_url: &str, proxy: Option<&ProxyConfig>) -> LlmResult<Ollama> {
        let parsed = url::Url::parse(base_url).map_err(|e| LlmError::InvalidRequest {
            message: format!("invalid Ollama base URL {}: {}", base_url, e),
        })?;
        let host = parsed.host_str().unwrap_or("localhost");
        let port = parsed.port().unwrap_or(OLLAMA_DEFAULT_PORT);
        let host_url = format!("{}://{}", parsed.scheme(), host);

        let http_client = build_http_client(proxy)?;
        Ok(Ollama::new_with_client(host_url, port, http_client))
    }

    /// Get the base URL for the Ollama server (used in error messages)
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OLLAMA_DEFAULT_URL)
    }

    /// Build a ChatMessageRequest from our unified types
    fn build_chat_request(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
        request_options: &LlmRequestOptions,
    ) -> ChatMessageRequest {
        let mut chat_messages: Vec<ChatMessage> = Vec::new();
        if let Some(sys) = system {
            chat_messages.push(ChatMessage::system(sys.to_string()));
        }
        for msg in messages {
            chat_messages.extend(self.convert_message(msg));
        }

        let mut request = ChatMessageRequest::new(self.config.model.clone(), chat_messages);

        let temperature = request_options
            .temperature_override
            .unwrap_or(self.config.temperature);
        let mut opts = ModelOptions::default().temperature(temperature);
        if self.config.max_tokens > 0 {
            opts = opts.num_predict(self.config.max_tokens as i32);
        }
        request = request.options(opts);

        let ollama_tools: Vec<ToolInfo> = tools
            .iter()
            .filter_map(|t| self.convert_tool_definition(t))
            .collect();
        if !ollama_tools.is_empty() {
            request = request.tools(ollama_tools);
        }

        request
    }

    /// Convert a unified Message to ollama-rs ChatMessage(s).
    fn convert_message(&self, message: &Message) -> Vec<ChatMessage> {
        let role = match message.role {
            MessageRole::User => OllamaRole::User,
            MessageRole::Assistant => OllamaRole::Assistant,
            MessageRole::System => OllamaRole::System,
        };

        let mut result = vec![ChatMessage::new(role, message.text_content())];
        for content in &message.content {
            if let MessageContent::ToolUse { name, input, .. } = content {
                let mut msg = ChatMessage::assistant(String::new());
                msg.tool_calls = vec![ollama_rs::generation::tools::ToolCall {
                    function: ToolCallFunction {
                        name: name.clone(),
                        arguments: input.clone(),
                    },
                }];
                result.push(msg);
            }
        }
        result
    }

    /// Convert a unified ToolDefinition to ollama-rs ToolInfo.
    ///
    /// ParameterSchema is already JSON Schema shaped, so a JSON round-trip
    /// yields the schemars Schema the SDK expects.
    fn convert_tool_definition(&self, tool: &ToolDefinition) -> Option<ToolInfo> {
        let schema = serde_json::to_value(&tool.input_schema)
            .and_then(serde_json::from_value::<schemars::Schema>);
        match schema {
            Ok(parameters) => Some(ToolInfo {
                tool_type: ToolType::Function,
                function: ToolFunctionInfo {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters,
                },
            }),
            Err(e) => {
                warn!(tool = %tool.name, error = %e, "dropping tool with unconvertible schema");
                None
            }
        }
    }

    /// Convert an ollama-rs ChatMessageResponse to our unified LlmResponse.
    fn convert_response(&self, response: &ChatMessageResponse) -> LlmResponse {
        let msg = &response.message;
        let (thinking, content) = extract_thinking(&msg.content);

        let tool_calls: Vec<ToolCall> = msg
            .tool_calls
            .iter()
            .enumerate()
            .map(|(i, tc)| ToolCall {
                id: format!("call_{}", i),
                name: tc.function.name.clone(),
                arguments: tc.function.arguments.clone(),
            })
            .collect();

        let stop_reason = if tool_calls.is_empty() {
            StopReason::EndTurn
        } else {
            StopReason::ToolUse
        };

        let usage = response
            .final_data
            .as_ref()
            .map(|final_data| UsageStats {
                input_tokens: final_data.prompt_eval_count as u32,
                output_tokens: final_data.eval_count as u32,
                thinking_tokens: None,
            })
            .unwrap_or_default();

        LlmResponse {
            content,
            thinking,
            tool_calls,
            stop_reason,
            usage,
            model: response.model.clone(),
        }
    }

    fn map_sdk_error(&self, message: String) -> LlmError {
        if message.contains("connect") || message.contains("Connection refused") {
            LlmError::ProviderUnavailable {
                message: format!("Cannot connect to Ollama at {}: {}", self.base_url(), message),
            }
        } else if message.contains("not found") || message.contains("404") {
            LlmError::ModelNotFound {
                model: self.config.model.clone(),
            }
        } else {
            LlmError::NetworkError { message }
        }
    }
}

/// Split `<think>...</think>` sections out of reasoning-model output.
///
/// Returns `(thinking, text)`; either side is `None` when empty.
fn extract_thinking(content: &str) -> (Option<String>, Option<String>) {
    let mut thinking = String::new();
    let mut text = String::new();
    let mut rest = content;

    while let Some(start) = rest.find("<think>") {
        text.push_str(&rest[..start]);
        let after = &rest[start + "<think>".len()..];
        match after.find("</think>") {
            Some(end) => {
                thinking.push_str(&after[..end]);
                rest = &after[end + "</think>".len()..];
            }
            None => {
                thinking.push_str(after);
                rest = "";
            }
        }
    }
    text.push_str(rest);

    let non_empty = |s: String| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };
    (non_empty(thinking), non_empty(text))
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn supports_tools(&self) -> bool {
        true
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let request =
            self.build_chat_request(&messages, system.as_deref(), &tools, &request_options);

        debug!(model = %self.config.model, host = %self.base_url(), "sending ollama request");

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| self.map_sdk_error(e.to_string()))?;

        Ok(self.convert_response(&response))
    }

    async fn health_check(&self) -> LlmResult<()> {
        let models = self
            .client
            .list_local_models()
            .await
            .map_err(|e| self.map_sdk_error(e.to_string()))?;

        let tagged = format!("{}:", self.config.model);
        if models
            .iter()
            .any(|m| m.name == self.config.model || m.name.starts_with(&tagged))
        {
            Ok(())
        } else {
            Err(LlmError::ModelNotFound {
                model: self.config.model.clone(),
            })
        }
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
