//! Test doubles shared by the integration tests.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use zip::write::SimpleFileOptions;

use failscope::services::github::unpack_zip;
use failscope_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
    StopReason, ToolCall, ToolDefinition, UsageStats,
};
use failscope_reports::{
    Artifact, ArtifactFile, ArtifactSource, SourceError, SourceResult, WorkflowRun,
};

// ============================================================================
// Scripted LLM provider
// ============================================================================

pub struct ScriptedProvider {
    config: ProviderConfig,
    tools: bool,
    replies: Mutex<Vec<LlmResult<LlmResponse>>>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<LlmResult<LlmResponse>>, tools: bool) -> Self {
        Self {
            config: ProviderConfig::default(),
            tools,
            replies: Mutex::new(replies),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    fn supports_tools(&self) -> bool {
        self.tools
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        _system: Option<String>,
        _tools: Vec<ToolDefinition>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .extend(messages.iter().map(|m| m.text_content()));
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(LlmError::Other {
                message: "no scripted reply left".to_string(),
            });
        }
        replies.remove(0)
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

pub fn text_response(text: &str) -> LlmResult<LlmResponse> {
    Ok(LlmResponse {
        content: Some(text.to_string()),
        thinking: None,
        tool_calls: Vec::new(),
        stop_reason: StopReason::EndTurn,
        usage: UsageStats {
            input_tokens: 900,
            output_tokens: 150,
            thinking_tokens: None,
        },
        model: String::new(),
    })
}

pub fn tool_response(name: &str, arguments: serde_json::Value) -> LlmResult<LlmResponse> {
    Ok(LlmResponse {
        content: None,
        thinking: None,
        tool_calls: vec![ToolCall {
            id: "toolu_01".to_string(),
            name: name.to_string(),
            arguments,
        }],
        stop_reason: StopReason::ToolUse,
        usage: UsageStats {
            input_tokens: 1100,
            output_tokens: 210,
            thinking_tokens: None,
        },
        model: "scripted-1-20260101".to_string(),
    })
}

// ============================================================================
// In-memory artifact source serving zip archives
// ============================================================================

pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn run(id: u64, conclusion: &str) -> WorkflowRun {
    WorkflowRun {
        id,
        name: Some("CI".to_string()),
        conclusion: Some(conclusion.to_string()),
        status: Some("completed".to_string()),
        head_branch: Some("main".to_string()),
        created_at: None,
    }
}

pub fn artifact(id: u64, name: &str) -> Artifact {
    Artifact {
        id,
        name: name.to_string(),
        size_in_bytes: 1024,
        expired: false,
    }
}

#[derive(Default)]
pub struct ZipSource {
    pub runs: HashMap<String, Vec<WorkflowRun>>,
    pub artifacts: HashMap<u64, Vec<Artifact>>,
    pub archives: HashMap<u64, Vec<u8>>,
    pub repositories: Vec<String>,
    pub downloadable: bool,
    pub downloads: AtomicUsize,
}

#[async_trait]
impl ArtifactSource for ZipSource {
    async fn list_workflow_runs(
        &self,
        repo: &str,
        limit: usize,
    ) -> SourceResult<Vec<WorkflowRun>> {
        let runs = self
            .runs
            .get(repo)
            .ok_or_else(|| SourceError::NotFound(repo.to_string()))?;
        Ok(runs.iter().take(limit).cloned().collect())
    }

    async fn list_artifacts(&self, _repo: &str, run_id: u64) -> SourceResult<Vec<Artifact>> {
        Ok(self.artifacts.get(&run_id).cloned().unwrap_or_default())
    }

    fn can_download(&self) -> bool {
        self.downloadable
    }

    async fn download_artifact(
        &self,
        _repo: &str,
        artifact: &Artifact,
    ) -> SourceResult<Vec<ArtifactFile>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .archives
            .get(&artifact.id)
            .ok_or_else(|| SourceError::NotFound(format!("artifact {}", artifact.id)))?;
        unpack_zip(bytes)
    }

    async fn search_repositories(&self, _query: &str, limit: usize) -> SourceResult<Vec<String>> {
        Ok(self.repositories.iter().take(limit).cloned().collect())
    }
}

// ============================================================================
// Report fixtures
// ============================================================================

pub const PLAYWRIGHT_REPORT: &str = r#"{
  "config": {"version": "1.48.0"},
  "suites": [
    {
      "title": "checkout.spec.ts",
      "file": "checkout.spec.ts",
      "specs": [],
      "suites": [
        {
          "title": "Checkout",
          "file": "checkout.spec.ts",
          "specs": [
            {
              "title": "pays with card",
              "file": "checkout.spec.ts",
              "line": 14,
              "tests": [
                {
                  "projectName": "chromium",
                  "status": "unexpected",
                  "results": [
                    {
                      "status": "timedOut",
                      "duration": 30012,
                      "error": {
                        "message": "Test timeout of 30000ms exceeded.",
                        "stack": "Error: Test timeout of 30000ms exceeded.\n    at checkout.spec.ts:22:18"
                      }
                    }
                  ]
                }
              ]
            },
            {
              "title": "shows cart",
              "file": "checkout.spec.ts",
              "line": 40,
              "tests": [
                {"projectName": "chromium", "status": "expected",
                 "results": [{"status": "passed", "duration": 812}]}
              ]
            }
          ]
        }
      ]
    }
  ],
  "stats": {"expected": 1, "unexpected": 1, "flaky": 0, "skipped": 0, "duration": 31250.4}
}"#;

pub const PASSING_PLAYWRIGHT_REPORT: &str = r#"{
  "config": {},
  "suites": [
    {
      "title": "home.spec.ts",
      "specs": [
        {"title": "renders", "tests": [{"status": "expected", "results": [{"status": "passed", "duration": 120}]}]}
      ]
    }
  ],
  "stats": {"expected": 1, "unexpected": 0, "flaky": 0, "skipped": 0, "duration": 400}
}"#;
