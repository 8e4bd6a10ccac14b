//! Report Models
//!
//! The normalized test-report tree shared by every report format, plus the
//! closed set of report kinds the detector can classify.

use serde::{Deserialize, Serialize};

/// Report kinds recognized by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    /// Playwright JSON reporter output (full report or blob stats)
    Playwright,
    /// Jest `--json` output
    Jest,
    /// JUnit-style report
    JUnit,
    /// Anything else
    Unknown,
}

impl ReportType {
    /// Check if this type is a recognized report kind
    pub fn is_known(&self) -> bool {
        !matches!(self, ReportType::Unknown)
    }

    /// Framework label carried by parsed reports of this type
    pub fn framework(&self) -> &'static str {
        match self {
            ReportType::Playwright => "playwright",
            ReportType::Jest => "jest",
            ReportType::JUnit => "junit",
            ReportType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.framework())
    }
}

/// Outcome of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "passed"),
            TestStatus::Failed => write!(f, "failed"),
            TestStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// A single test case (leaf of the report tree)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Test name as displayed by the framework
    pub name: String,
    /// Outcome
    pub status: TestStatus,
    /// Duration in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
    /// Failure message, when the test failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Failure stack trace, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    /// Source file declaring the test
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Line of the test declaration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl TestCase {
    /// Create a test case with no failure details
    pub fn new(name: impl Into<String>, status: TestStatus) -> Self {
        Self {
            name: name.into(),
            status,
            duration_ms: 0,
            error_message: None,
            stack_trace: None,
            file_path: None,
            line: None,
        }
    }

    /// Check if this test failed
    pub fn is_failed(&self) -> bool {
        self.status == TestStatus::Failed
    }

    /// `file:line` (or just `file`) when the location is known
    pub fn location(&self) -> Option<String> {
        let file = self.file_path.as_deref()?;
        Some(match self.line {
            Some(line) => format!("{}:{}", file, line),
            None => file.to_string(),
        })
    }
}

/// A named group of test cases, possibly nested
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Test cases declared directly in this suite
    #[serde(default)]
    pub tests: Vec<TestCase>,
    /// Nested suites
    #[serde(default)]
    pub suites: Vec<TestSuite>,
    /// Source file of the suite
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl TestSuite {
    /// Create an empty suite
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Depth-first walk: a suite's own tests come before its child suites.
    fn collect_failed<'a>(&'a self, out: &mut Vec<&'a TestCase>) {
        out.extend(self.tests.iter().filter(|t| t.is_failed()));
        for suite in &self.suites {
            suite.collect_failed(out);
        }
    }

    fn count_status(&self, status: TestStatus) -> usize {
        self.tests.iter().filter(|t| t.status == status).count()
            + self
                .suites
                .iter()
                .map(|s| s.count_status(status))
                .sum::<usize>()
    }
}

/// Aggregate counts of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounts {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl ReportCounts {
    /// Check if the counts report any failure
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Normalized test report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Framework label (`playwright`, `jest`, `junit`)
    pub framework: String,
    /// Total number of tests
    pub total_tests: u64,
    /// Number of passed tests
    pub passed_tests: u64,
    /// Number of failed tests
    pub failed_tests: u64,
    /// Number of skipped tests
    pub skipped_tests: u64,
    /// Total run duration in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
    /// Root suites
    #[serde(default)]
    pub suites: Vec<TestSuite>,
}

impl Report {
    /// Build a report whose counters are derived from the suite tree
    pub fn from_suites(framework: impl Into<String>, suites: Vec<TestSuite>) -> Self {
        let mut report = Self {
            framework: framework.into(),
            total_tests: 0,
            passed_tests: 0,
            failed_tests: 0,
            skipped_tests: 0,
            duration_ms: 0,
            suites,
        };
        report.apply_counts(report.tree_counts());
        report
    }

    /// Overwrite the aggregate counters
    pub fn apply_counts(&mut self, counts: ReportCounts) {
        self.total_tests = counts.total;
        self.passed_tests = counts.passed;
        self.failed_tests = counts.failed;
        self.skipped_tests = counts.skipped;
    }

    /// Aggregate counters as stored on the report
    pub fn counts(&self) -> ReportCounts {
        ReportCounts {
            total: self.total_tests,
            passed: self.passed_tests,
            failed: self.failed_tests,
            skipped: self.skipped_tests,
        }
    }

    /// True iff the aggregate failed counter is non-zero.
    ///
    /// This trusts the counter and does not walk the tree; see
    /// [`Report::counts_consistent`].
    pub fn has_failures(&self) -> bool {
        self.failed_tests > 0
    }

    /// Failed test cases in depth-first, suite-list order
    pub fn failed_test_cases(&self) -> Vec<&TestCase> {
        let mut out = Vec::new();
        for suite in &self.suites {
            suite.collect_failed(&mut out);
        }
        out
    }

    /// Number of failed leaves in the suite tree
    pub fn tree_failure_count(&self) -> u64 {
        self.suites
            .iter()
            .map(|s| s.count_status(TestStatus::Failed) as u64)
            .sum()
    }

    /// Counts derived by walking the suite tree
    pub fn tree_counts(&self) -> ReportCounts {
        let count = |status| {
            self.suites
                .iter()
                .map(|s| s.count_status(status) as u64)
                .sum::<u64>()
        };
        let passed = count(TestStatus::Passed);
        let failed = count(TestStatus::Failed);
        let skipped = count(TestStatus::Skipped);
        ReportCounts {
            total: passed + failed + skipped,
            passed,
            failed,
            skipped,
        }
    }

    /// Whether the failed counter agrees with the suite tree
    pub fn counts_consistent(&self) -> bool {
        self.failed_tests == self.tree_failure_count()
    }
}
