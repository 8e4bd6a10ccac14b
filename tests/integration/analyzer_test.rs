//! Analyzer Integration Tests
//!
//! Drives the analyzer from raw report bytes with a scripted provider and
//! checks the serialized output contracts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use failscope::{Analyzer, AnalyzerConfig, AppError, OutputFormat};
use failscope_analysis::{AnalysisResult, Category, ROOT_CAUSE_TOOL_NAME};
use failscope_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
    ToolDefinition,
};

use super::support::{
    text_response, tool_response, ScriptedProvider, PASSING_PLAYWRIGHT_REPORT, PLAYWRIGHT_REPORT,
};

fn analyzer(provider: Arc<ScriptedProvider>, format: OutputFormat) -> Analyzer {
    Analyzer::new(
        provider,
        AnalyzerConfig {
            output_format: format,
        },
    )
}

#[tokio::test]
async fn test_passing_report_is_nothing_to_analyze() {
    let provider = Arc::new(ScriptedProvider::new(vec![], false));
    let outcome = analyzer(provider.clone(), OutputFormat::Structured)
        .analyze_artifact(
            "results.json",
            PASSING_PLAYWRIGHT_REPORT.as_bytes(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!outcome.is_analyzed());
    assert_eq!(provider.call_count(), 0);

    let structured = serde_json::to_value(outcome.into_structured()).unwrap();
    assert_eq!(structured["category"], "no-failures");
    assert_eq!(structured["provider"], "scripted");
    assert!(structured.get("rca").is_none());
}

#[tokio::test]
async fn test_legacy_output_contract() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![text_response(
            "```json\n{\"root_cause\": \"Payment iframe blocked\", \"evidence\": [\"Test timeout of 30000ms exceeded.\"], \"suggested_fix\": \"Allow the frame\", \"confidence\": \"HIGH\"}\n```",
        )],
        false,
    ));
    let outcome = analyzer(provider, OutputFormat::Legacy)
        .analyze_artifact(
            "results.json",
            PLAYWRIGHT_REPORT.as_bytes(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let result = outcome.into_structured();
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["diagnosis"]["root_cause"], "Payment iframe blocked");
    assert_eq!(value["diagnosis"]["confidence"], "HIGH");
    assert!(value["diagnosis"].get("confidence_explanation").is_none());
    assert_eq!(value["input_tokens"], 900);
    assert_eq!(value["output_tokens"], 150);
    assert_eq!(value["provider"], "scripted");
    // The response carried no model name, so the provider's model is used
    assert_eq!(value["model"], "scripted-1");
    assert_eq!(result.confidence_score(), 90);
}

#[tokio::test]
async fn test_structured_output_contract() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![tool_response(
            ROOT_CAUSE_TOOL_NAME,
            json!({
                "title": "Checkout payment times out",
                "failure_type": "timeout",
                "location": {"file_path": "checkout.spec.ts", "line_number": 22, "function_name": "pays with card"},
                "symptom": "Test timeout of 30000ms exceeded.",
                "root_cause": "Payment iframe blocked by CSP",
                "evidence": [{"type": "log", "content": "Test timeout of 30000ms exceeded."}],
                "remediation": "Allow pay.example.com in frame-src",
                "confidence": 88,
                "sensitivity": "high"
            }),
        )],
        true,
    ));
    let outcome = analyzer(provider, OutputFormat::Structured)
        .analyze_artifact(
            "results.json",
            PLAYWRIGHT_REPORT.as_bytes(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let Some(AnalysisResult::Structured(analysis)) = outcome.result() else {
        panic!("expected a structured result");
    };
    assert_eq!(analysis.category, Category::Diagnosis);

    let value = serde_json::to_value(analysis).unwrap();
    assert_eq!(value["category"], "diagnosis");
    assert_eq!(value["confidence"], 88);
    assert_eq!(value["sensitivity"], "high");
    assert_eq!(value["rca"]["failure_type"], "timeout");
    assert_eq!(value["rca"]["location"]["line_number"], 22);
    assert!(value.get("text").is_none());
    assert_eq!(value["model"], "scripted-1-20260101");
}

#[tokio::test]
async fn test_transport_failure_aborts() {
    let provider = Arc::new(ScriptedProvider::new(
        vec![Err(LlmError::ServerError {
            message: "overloaded".to_string(),
            status: Some(529),
        })],
        false,
    ));
    let err = analyzer(provider, OutputFormat::Legacy)
        .analyze_artifact(
            "results.json",
            PLAYWRIGHT_REPORT.as_bytes(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Llm(LlmError::ServerError { .. })));
}

#[tokio::test]
async fn test_unparseable_report_is_core_error() {
    let provider = Arc::new(ScriptedProvider::new(vec![], false));
    let err = analyzer(provider.clone(), OutputFormat::Legacy)
        .analyze_artifact("report.json", b"{\"hello\": true}", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Core(_)));
    assert_eq!(provider.call_count(), 0);
}

/// Provider that never answers.
struct StalledProvider {
    config: ProviderConfig,
}

#[async_trait]
impl LlmProvider for StalledProvider {
    fn name(&self) -> &'static str {
        "stalled"
    }

    fn model(&self) -> &str {
        "stalled-1"
    }

    fn supports_tools(&self) -> bool {
        false
    }

    async fn send_message(
        &self,
        _messages: Vec<Message>,
        _system: Option<String>,
        _tools: Vec<ToolDefinition>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(LlmError::Other {
            message: "unreachable".to_string(),
        })
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[tokio::test(start_paused = true)]
async fn test_deadline_cancels_model_call() {
    let analyzer = Analyzer::new(
        Arc::new(StalledProvider {
            config: ProviderConfig::default(),
        }),
        AnalyzerConfig::default(),
    );
    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        deadline.cancel();
    });

    let err = analyzer
        .analyze_artifact("results.json", PLAYWRIGHT_REPORT.as_bytes(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Cancelled));
}
