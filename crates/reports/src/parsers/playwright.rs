//! Playwright JSON reporter output.

use failscope_core::{CoreError, CoreResult};
use serde::Deserialize;
use serde_json::Value;

use super::millis;
use crate::models::{Report, ReportCounts, TestCase, TestStatus, TestSuite};

#[derive(Debug, Deserialize)]
struct PwReport {
    #[serde(default)]
    suites: Vec<PwSuite>,
    #[serde(default)]
    stats: Option<PwStats>,
}

#[derive(Debug, Deserialize)]
struct PwStats {
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PwSuite {
    #[serde(default)]
    title: String,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    specs: Vec<PwSpec>,
    #[serde(default)]
    suites: Vec<PwSuite>,
}

#[derive(Debug, Deserialize)]
struct PwSpec {
    #[serde(default)]
    title: String,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    tests: Vec<PwTest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PwTest {
    #[serde(default)]
    project_name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    results: Vec<PwResult>,
}

#[derive(Debug, Deserialize)]
struct PwResult {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    error: Option<PwError>,
    #[serde(default)]
    errors: Vec<PwError>,
}

#[derive(Debug, Deserialize)]
struct PwError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    stack: Option<String>,
}

/// Parse a Playwright report document.
///
/// `counts` are the detector's `stats` counts; when absent the counters are
/// derived from the suite tree.
pub fn parse_playwright(doc: Value, counts: Option<ReportCounts>) -> CoreResult<Report> {
    let raw: PwReport = serde_json::from_value(doc)
        .map_err(|e| CoreError::parse(format!("invalid Playwright report: {}", e)))?;

    let suites = raw.suites.iter().map(convert_suite).collect();
    let mut report = Report::from_suites("playwright", suites);
    if let Some(counts) = counts {
        report.apply_counts(counts);
    }
    report.duration_ms = raw
        .stats
        .and_then(|s| s.duration)
        .map(millis)
        .unwrap_or(0);
    Ok(report)
}

fn convert_suite(suite: &PwSuite) -> TestSuite {
    let tests = suite
        .specs
        .iter()
        .flat_map(|spec| spec.tests.iter().map(move |test| convert_test(spec, test, suite)))
        .collect();

    TestSuite {
        name: suite.title.clone(),
        tests,
        suites: suite.suites.iter().map(convert_suite).collect(),
        file_path: suite.file.clone(),
    }
}

fn convert_test(spec: &PwSpec, test: &PwTest, suite: &PwSuite) -> TestCase {
    let last = test.results.last();
    let name = match test.project_name.as_deref().filter(|p| !p.is_empty()) {
        Some(project) => format!("[{}] {}", project, spec.title),
        None => spec.title.clone(),
    };
    let error = last.and_then(|r| r.error.as_ref().or_else(|| r.errors.first()));

    TestCase {
        name,
        status: test_status(test),
        duration_ms: last.and_then(|r| r.duration).map(millis).unwrap_or(0),
        error_message: error.and_then(|e| e.message.clone()),
        stack_trace: error.and_then(|e| e.stack.clone()),
        file_path: spec.file.clone().or_else(|| suite.file.clone()),
        line: spec.line,
    }
}

fn test_status(test: &PwTest) -> TestStatus {
    match test.status.as_deref() {
        Some("expected") | Some("flaky") => TestStatus::Passed,
        Some("unexpected") => TestStatus::Failed,
        Some("skipped") => TestStatus::Skipped,
        _ => match test.results.last().and_then(|r| r.status.as_deref()) {
            Some("failed") | Some("timedOut") | Some("interrupted") => TestStatus::Failed,
            Some("skipped") => TestStatus::Skipped,
            _ => TestStatus::Passed,
        },
    }
}
