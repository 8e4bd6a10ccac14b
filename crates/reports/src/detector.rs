//! Report-Type Detection
//!
//! Classifies raw report bytes and artifact names into a [`ReportType`].
//! Both paths are pure and total: every input yields exactly one type,
//! malformed content included.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::models::{ReportCounts, ReportType};

/// Ordered name rules, evaluated first-match-wins against the lower-cased name.
pub const NAME_RULES: &[(&[&str], ReportType)] = &[
    (&["playwright", "blob-report"], ReportType::Playwright),
    (&["jest"], ReportType::Jest),
    (&["junit"], ReportType::JUnit),
    // Generic e2e artifacts are assumed to come from Playwright.
    (&["test-results", "e2e"], ReportType::Playwright),
];

/// Vocabulary an artifact name must contain (any of) to be considered at all.
pub const ARTIFACT_NAME_VOCABULARY: &[&str] =
    &["playwright", "test", "report", "e2e", "results", "blob"];

/// Base names of files inside an artifact that are worth probing.
const REPORT_FILE_PATTERN: &str = r"^[^/]*(report|results|test|playwright|jest)[^/]*\.json$";

/// Result of content-based detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Detected report kind
    pub report_type: ReportType,
    /// Counts extracted from the report, when the schema carries them
    pub counts: Option<ReportCounts>,
}

impl Detection {
    fn of(report_type: ReportType) -> Self {
        Self {
            report_type,
            counts: None,
        }
    }

    /// Detection that recognized nothing
    pub fn unknown() -> Self {
        Self::of(ReportType::Unknown)
    }
}

/// Classify raw report bytes by their JSON shape.
pub fn detect_report_content(bytes: &[u8]) -> Detection {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(doc)) => detect_document(&doc),
        _ => Detection::unknown(),
    }
}

/// Classify an already-parsed JSON document.
pub fn detect_document(doc: &Map<String, Value>) -> Detection {
    let has_suites = doc.contains_key("suites");
    let stats = doc.get("stats").and_then(Value::as_object);

    if has_suites && (doc.contains_key("config") || stats.is_some()) {
        return Detection {
            report_type: ReportType::Playwright,
            counts: stats.map(playwright_counts),
        };
    }
    if doc.contains_key("testResults") {
        return Detection::of(ReportType::Jest);
    }
    if doc.contains_key("testsuite") || doc.contains_key("testsuites") {
        return Detection::of(ReportType::JUnit);
    }
    Detection::unknown()
}

/// Extract counts from a Playwright `stats` object.
///
/// Handles both the full-report shape (`expected`/`unexpected`/`flaky`/`skipped`)
/// and the blob shape (`passed`/`failed`/`skipped`/`total`).
pub fn playwright_counts(stats: &Map<String, Value>) -> ReportCounts {
    let field = |key: &str| stats.get(key).and_then(Value::as_u64);

    let expected = field("expected");
    let unexpected = field("unexpected");
    let flaky = field("flaky");
    let skipped = field("skipped").unwrap_or(0);

    let failed = unexpected.or_else(|| field("failed")).unwrap_or(0);
    let literal_passed = field("passed");
    let passed =
        literal_passed.unwrap_or(expected.unwrap_or(0).saturating_add(flaky.unwrap_or(0)));

    let accumulated = [expected, unexpected, flaky]
        .iter()
        .any(Option::is_some)
        .then(|| saturating_sum(&[expected, unexpected, flaky, Some(skipped)]));

    let total = field("total")
        .or_else(|| {
            literal_passed.map(|p| saturating_sum(&[Some(p), Some(failed), Some(skipped)]))
        })
        .or(accumulated)
        .unwrap_or_else(|| saturating_sum(&[Some(passed), Some(failed), Some(skipped)]));

    ReportCounts {
        total,
        passed,
        failed,
        skipped,
    }
}

/// Counters come from untrusted reports, so sums saturate instead of overflowing.
pub(crate) fn saturating_sum(values: &[Option<u64>]) -> u64 {
    values
        .iter()
        .flatten()
        .fold(0u64, |acc, v| acc.saturating_add(*v))
}

/// Classify an artifact by its display name.
pub fn detect_report_name(name: &str) -> ReportType {
    let lower = name.to_lowercase();
    NAME_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, report_type)| *report_type)
        .unwrap_or(ReportType::Unknown)
}

/// Whether an artifact name passes the discovery name filter.
pub fn matches_artifact_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    ARTIFACT_NAME_VOCABULARY.iter().any(|v| lower.contains(v))
}

fn report_file_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(REPORT_FILE_PATTERN).ok())
        .as_ref()
}

/// Whether a file inside an artifact looks like a JSON report.
///
/// Only the base name is considered, case-insensitively.
pub fn is_report_file(path: &str) -> bool {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path).to_lowercase();
    report_file_regex().is_some_and(|re| re.is_match(&base))
}

/// Whether a file inside an artifact could be a JUnit XML report.
pub fn is_xml_report_file(path: &str) -> bool {
    path.to_lowercase().ends_with(".xml")
}
