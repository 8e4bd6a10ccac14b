//! Analyzer
//!
//! Sequences one diagnosis: check the report has failures, build the prompt,
//! call the model, recover a diagnosis from the answer and assemble the
//! result with token accounting.
//!
//! Transport failures end the invocation unchanged. An answer that cannot be
//! parsed degrades to a low-confidence or unstructured result instead.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use failscope_analysis::{
    build_prompt, extract_json_object, parse_diagnosis, rca_from_arguments, root_cause_tool,
    AnalysisOutcome, AnalysisResult, Category, Diagnosis, DiagnosisReport, StructuredAnalysis,
    DIAGNOSIS_SYSTEM_PROMPT, ROOT_CAUSE_SYSTEM_PROMPT, ROOT_CAUSE_TOOL_NAME,
};
use failscope_llm::{
    LlmProvider, LlmRequestOptions, LlmResponse, Message, ToolCallMode, ToolDefinition,
};
use failscope_reports::{parse_report, Report};

use crate::models::settings::{AnalyzerConfig, AppConfig, OutputFormat};
use crate::services::llm::create_provider;
use crate::utils::error::{AppError, AppResult};

/// Failure analyzer bound to one provider and an immutable configuration
pub struct Analyzer {
    provider: Arc<dyn LlmProvider>,
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: AnalyzerConfig) -> Self {
        Self { provider, config }
    }

    /// Build the configured provider and wrap it.
    pub fn from_app_config(config: &AppConfig) -> AppResult<Self> {
        let provider = create_provider(&config.effective_llm())?;
        Ok(Self::new(provider, config.analysis.clone()))
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Analyze the failures of a parsed report.
    pub async fn analyze(
        &self,
        report: &Report,
        cancel: &CancellationToken,
    ) -> AppResult<AnalysisOutcome> {
        if !report.counts_consistent() {
            warn!(
                failed_counter = report.failed_tests,
                failed_in_tree = report.tree_failure_count(),
                "report failure counter disagrees with its test tree"
            );
        }

        if !report.has_failures() {
            info!(framework = %report.framework, "no failed tests, nothing to analyze");
            return Ok(AnalysisOutcome::NothingToAnalyze {
                provider: self.provider.name().to_string(),
                model: self.provider.model().to_string(),
            });
        }

        let prompt = build_prompt(report);
        let result = match self.config.output_format {
            OutputFormat::Legacy => self.analyze_legacy(prompt, cancel).await?,
            OutputFormat::Structured => self.analyze_structured(prompt, cancel).await?,
        };
        Ok(AnalysisOutcome::Analyzed { result })
    }

    /// Parse one report file and analyze it.
    pub async fn analyze_artifact(
        &self,
        file_name: &str,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> AppResult<AnalysisOutcome> {
        let report = parse_report(file_name, bytes)?;
        self.analyze(&report, cancel).await
    }

    async fn complete(
        &self,
        prompt: String,
        system: &str,
        tools: Vec<ToolDefinition>,
        options: LlmRequestOptions,
        cancel: &CancellationToken,
    ) -> AppResult<LlmResponse> {
        let request = self.provider.send_message(
            vec![Message::user(prompt)],
            Some(system.to_string()),
            tools,
            options,
        );

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            response = request => response?,
        };

        info!(
            provider = self.provider.name(),
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total_tokens(),
            "model call finished"
        );
        Ok(response)
    }

    fn resolved_model(&self, response: &LlmResponse) -> String {
        if response.model.trim().is_empty() {
            self.provider.model().to_string()
        } else {
            response.model.clone()
        }
    }

    async fn analyze_legacy(
        &self,
        prompt: String,
        cancel: &CancellationToken,
    ) -> AppResult<AnalysisResult> {
        let response = self
            .complete(
                prompt,
                DIAGNOSIS_SYSTEM_PROMPT,
                Vec::new(),
                LlmRequestOptions::default(),
                cancel,
            )
            .await?;

        let text = response.text();
        let diagnosis = parse_diagnosis(&text).unwrap_or_else(|e| {
            warn!(error = %e, "model response is not a diagnosis, keeping it verbatim");
            Diagnosis::fallback(text.clone())
        });

        Ok(AnalysisResult::Legacy(DiagnosisReport {
            diagnosis,
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
            provider: self.provider.name().to_string(),
            model: self.resolved_model(&response),
        }))
    }

    async fn analyze_structured(
        &self,
        prompt: String,
        cancel: &CancellationToken,
    ) -> AppResult<AnalysisResult> {
        let (tools, options) = if self.provider.supports_tools() {
            let options = LlmRequestOptions {
                tool_call_mode: ToolCallMode::Required,
                ..Default::default()
            };
            (vec![root_cause_tool()], options)
        } else {
            (Vec::new(), LlmRequestOptions::default())
        };

        let response = self
            .complete(prompt, ROOT_CAUSE_SYSTEM_PROMPT, tools, options, cancel)
            .await?;

        let text = response.text();
        let tool_call = response.tool_call(ROOT_CAUSE_TOOL_NAME);
        let from_tool = tool_call.and_then(|call| {
            let extracted = rca_from_arguments(&call.arguments);
            if extracted.is_none() {
                warn!("root cause tool arguments are not an object, scanning text");
            }
            extracted
        });
        let extracted = from_tool.or_else(|| {
            debug!("no usable root cause tool call, scanning text for JSON");
            extract_json_object(&text).and_then(|value| rca_from_arguments(&value))
        });

        let mut analysis = StructuredAnalysis {
            category: Category::Unstructured,
            confidence: 0,
            sensitivity: Default::default(),
            rca: None,
            text: None,
            provider: self.provider.name().to_string(),
            model: self.resolved_model(&response),
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        };

        match extracted {
            Some(extracted) => {
                analysis.category = Category::Diagnosis;
                analysis.confidence = extracted.confidence;
                analysis.sensitivity = extracted.sensitivity;
                analysis.rca = Some(extracted.rca);
            }
            None => {
                warn!("model response carried no root cause structure");
                analysis.text = Some(unstructured_text(text, tool_call.map(|c| &c.arguments)));
            }
        }

        Ok(AnalysisResult::Structured(analysis))
    }
}

/// Raw model output kept when no structure could be recovered.
fn unstructured_text(text: String, arguments: Option<&Value>) -> String {
    let arguments = match arguments {
        Some(Value::String(raw)) => raw.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    match (text.trim().is_empty(), arguments.is_empty()) {
        (_, true) => text,
        (true, false) => arguments,
        (false, false) => format!("{}\n\n{}", text, arguments),
    }
}
