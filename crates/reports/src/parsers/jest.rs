//! Jest `--json` output.

use failscope_core::{CoreError, CoreResult};
use serde::Deserialize;
use serde_json::Value;

use crate::detector::saturating_sum;
use crate::models::{Report, ReportCounts, TestCase, TestStatus, TestSuite};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JestReport {
    #[serde(default)]
    num_total_tests: Option<u64>,
    #[serde(default)]
    num_passed_tests: Option<u64>,
    #[serde(default)]
    num_failed_tests: Option<u64>,
    #[serde(default)]
    num_pending_tests: Option<u64>,
    #[serde(default)]
    num_todo_tests: Option<u64>,
    #[serde(default)]
    test_results: Vec<JestFileResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JestFileResult {
    #[serde(default)]
    name: String,
    #[serde(default)]
    start_time: Option<f64>,
    #[serde(default)]
    end_time: Option<f64>,
    #[serde(default)]
    assertion_results: Vec<JestAssertion>,
    /// Older Jest versions nest assertions under `testResults`
    #[serde(default)]
    test_results: Vec<JestAssertion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JestAssertion {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    failure_messages: Vec<String>,
    #[serde(default)]
    location: Option<JestLocation>,
}

#[derive(Debug, Deserialize)]
struct JestLocation {
    #[serde(default)]
    line: Option<u32>,
}

/// Parse a Jest report document.
pub fn parse_jest(doc: Value) -> CoreResult<Report> {
    let raw: JestReport = serde_json::from_value(doc)
        .map_err(|e| CoreError::parse(format!("invalid Jest report: {}", e)))?;

    let suites = raw.test_results.iter().map(convert_file).collect();
    let mut report = Report::from_suites("jest", suites);

    if let (Some(total), Some(passed), Some(failed)) = (
        raw.num_total_tests,
        raw.num_passed_tests,
        raw.num_failed_tests,
    ) {
        report.apply_counts(ReportCounts {
            total,
            passed,
            failed,
            skipped: saturating_sum(&[raw.num_pending_tests, raw.num_todo_tests]),
        });
    }

    report.duration_ms = raw
        .test_results
        .iter()
        .filter_map(|f| Some(super::millis(f.end_time? - f.start_time?)))
        .fold(0u64, u64::saturating_add);
    Ok(report)
}

fn convert_file(file: &JestFileResult) -> TestSuite {
    let assertions = if file.assertion_results.is_empty() {
        &file.test_results
    } else {
        &file.assertion_results
    };

    TestSuite {
        name: file.name.clone(),
        tests: assertions
            .iter()
            .map(|a| convert_assertion(a, &file.name))
            .collect(),
        suites: Vec::new(),
        file_path: Some(file.name.clone()).filter(|n| !n.is_empty()),
    }
}

fn convert_assertion(assertion: &JestAssertion, file: &str) -> TestCase {
    let status = match assertion.status.as_str() {
        "passed" => TestStatus::Passed,
        "failed" => TestStatus::Failed,
        _ => TestStatus::Skipped,
    };

    let failure = assertion.failure_messages.join("\n");
    let (error_message, stack_trace) = if failure.trim().is_empty() {
        (None, None)
    } else {
        let first_line = failure
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_string();
        (Some(first_line), Some(failure))
    };

    TestCase {
        name: assertion
            .full_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| assertion.title.clone()),
        status,
        duration_ms: assertion.duration.map(super::millis).unwrap_or(0),
        error_message,
        stack_trace,
        file_path: Some(file.to_string()).filter(|f| !f.is_empty()),
        line: assertion.location.as_ref().and_then(|l| l.line),
    }
}
