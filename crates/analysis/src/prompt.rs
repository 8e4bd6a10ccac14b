//! Prompt Builder
//!
//! Renders a [`Report`] into a bounded prompt. Caps and truncation are exact
//! and character-based so the rendered text is deterministic.

use std::collections::HashMap;
use std::fmt::Write;

use failscope_llm::{ParameterSchema, ToolDefinition};
use failscope_reports::{Report, TestCase};

/// Failed tests rendered individually
pub const MAX_FAILURES_IN_PROMPT: usize = 10;
/// Characters of an error message kept before truncation
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;
/// Characters of a stack trace kept before truncation
pub const MAX_STACK_TRACE_CHARS: usize = 1000;
/// Appended to truncated text
pub const TRUNCATION_MARKER: &str = "...";
/// Line emitted when the report has no failed tests
pub const NO_FAILURES_LINE: &str = "No failed tests found in this report.";

/// Name of the structured root-cause tool
pub const ROOT_CAUSE_TOOL_NAME: &str = "report_root_cause";

// ============================================================================
// System Prompts
// ============================================================================

/// System instruction for the legacy text-completion mode.
pub const DIAGNOSIS_SYSTEM_PROMPT: &str = r#"You are a senior test engineer diagnosing failing automated tests (Playwright, Jest, JUnit).
Read the failure summary and identify the single most likely root cause shared by the failures.

Respond with ONLY a JSON object matching this schema:
{
  "root_cause": "One or two sentences naming the underlying cause",
  "evidence": ["Concrete quotes from the errors or stack traces that support the cause"],
  "suggested_fix": "The change most likely to make the tests pass",
  "confidence": "HIGH" | "MEDIUM" | "LOW",
  "confidence_explanation": "Why you chose that confidence"
}

Prefer causes that explain several failures at once. If the evidence is thin, say so and lower the confidence."#;

/// System instruction for the structured tool-call mode.
pub const ROOT_CAUSE_SYSTEM_PROMPT: &str = r#"You are a senior test engineer diagnosing failing automated tests (Playwright, Jest, JUnit).
Read the failure summary and identify the single most likely root cause shared by the failures.

Report your conclusion by calling the report_root_cause tool exactly once.
- failure_type: one of timeout, assertion, network, infra, flake (or a better fitting short tag)
- location: the file, line and function where the failure originates, when the stack trace shows it
- evidence: quote the errors, logs or stack frames that support the cause, each tagged with its type
- confidence: 0-100, how sure you are of the root cause
- sensitivity: low, medium or high, how much additional data (traces, screenshots, logs) could change the verdict

If tools are unavailable, respond with ONLY a JSON object carrying those same fields plus title, symptom, root_cause and remediation."#;

// ============================================================================
// Prompt Rendering
// ============================================================================

/// Keep the first `max_chars` characters, appending the marker when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

fn render_failure(out: &mut String, index: usize, test: &TestCase) {
    let _ = writeln!(out, "### {}. {}", index, test.name);
    if let Some(location) = test.location() {
        let _ = writeln!(out, "Location: {}", location);
    }
    if test.duration_ms > 0 {
        let _ = writeln!(out, "Duration: {}ms", test.duration_ms);
    }
    if let Some(message) = test.error_message.as_deref().filter(|m| !m.is_empty()) {
        let _ = writeln!(
            out,
            "Error:\n```\n{}\n```",
            truncate_chars(message, MAX_ERROR_MESSAGE_CHARS)
        );
    }
    if let Some(stack) = test.stack_trace.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(
            out,
            "Stack Trace:\n```\n{}\n```",
            truncate_chars(stack, MAX_STACK_TRACE_CHARS)
        );
    }
    out.push('\n');
}

/// Render the failure prompt for a report.
pub fn build_prompt(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "## Test Summary");
    let _ = writeln!(out, "Framework: {}", report.framework);
    let _ = writeln!(
        out,
        "Total: {} | Passed: {} | Failed: {} | Skipped: {}",
        report.total_tests, report.passed_tests, report.failed_tests, report.skipped_tests
    );
    out.push('\n');

    let failures = report.failed_test_cases();
    if failures.is_empty() {
        out.push_str(NO_FAILURES_LINE);
        out.push('\n');
        return out;
    }

    let _ = writeln!(out, "## Failed Tests\n");
    for (i, test) in failures.iter().take(MAX_FAILURES_IN_PROMPT).enumerate() {
        render_failure(&mut out, i + 1, test);
    }

    if failures.len() > MAX_FAILURES_IN_PROMPT {
        let _ = writeln!(
            out,
            "... and {} more failures",
            failures.len() - MAX_FAILURES_IN_PROMPT
        );
    }

    out
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Tool the model calls to report a structured root cause.
pub fn root_cause_tool() -> ToolDefinition {
    let mut location = HashMap::new();
    location.insert(
        "file_path".to_string(),
        ParameterSchema::string(Some("Source file where the failure originates")),
    );
    location.insert(
        "line_number".to_string(),
        ParameterSchema::integer(Some("Line number in that file")),
    );
    location.insert(
        "function_name".to_string(),
        ParameterSchema::string(Some("Enclosing function or test name")),
    );

    let mut evidence = HashMap::new();
    evidence.insert(
        "type".to_string(),
        ParameterSchema::string_enum(
            Some("Kind of evidence"),
            &["screenshot", "trace", "log", "network", "code"],
        ),
    );
    evidence.insert(
        "content".to_string(),
        ParameterSchema::string(Some("The quoted evidence")),
    );

    let mut properties = HashMap::new();
    properties.insert(
        "title".to_string(),
        ParameterSchema::string(Some("Short headline of the failure")),
    );
    properties.insert(
        "failure_type".to_string(),
        ParameterSchema::string(Some(
            "Failure category, commonly timeout, assertion, network, infra or flake",
        )),
    );
    properties.insert(
        "location".to_string(),
        ParameterSchema::object(
            Some("Where the failure originates"),
            location,
            vec!["file_path".to_string()],
        ),
    );
    properties.insert(
        "symptom".to_string(),
        ParameterSchema::string(Some("What the test observed")),
    );
    properties.insert(
        "root_cause".to_string(),
        ParameterSchema::string(Some("The underlying cause of the failure")),
    );
    properties.insert(
        "evidence".to_string(),
        ParameterSchema::array(
            Some("Evidence supporting the root cause"),
            ParameterSchema::object(
                None,
                evidence,
                vec!["type".to_string(), "content".to_string()],
            ),
        ),
    );
    properties.insert(
        "remediation".to_string(),
        ParameterSchema::string(Some("How to fix it")),
    );
    properties.insert(
        "confidence".to_string(),
        ParameterSchema::integer(Some("Confidence in the root cause, 0-100")),
    );
    properties.insert(
        "sensitivity".to_string(),
        ParameterSchema::string_enum(
            Some("How much additional data could change the verdict"),
            &["low", "medium", "high"],
        ),
    );

    ToolDefinition {
        name: ROOT_CAUSE_TOOL_NAME.to_string(),
        description: "Report the root cause of the failing tests.".to_string(),
        input_schema: ParameterSchema::object(
            None,
            properties,
            vec![
                "title".to_string(),
                "failure_type".to_string(),
                "symptom".to_string(),
                "root_cause".to_string(),
                "evidence".to_string(),
                "remediation".to_string(),
                "confidence".to_string(),
            ],
        ),
    }
}
