//! Report Parsing Integration Tests
//!
//! Parses one realistic report per format through `parse_report` and checks
//! the normalized tree, counters and failure queries.

use failscope_core::CoreError;
use failscope_reports::{detect_report_content, parse_report, ReportType, TestStatus};

use super::support::{PASSING_PLAYWRIGHT_REPORT, PLAYWRIGHT_REPORT};

const JEST_REPORT: &str = r#"{
  "numTotalTests": 3,
  "numPassedTests": 1,
  "numFailedTests": 1,
  "numPendingTests": 1,
  "numTodoTests": 0,
  "startTime": 1760000000000,
  "testResults": [
    {
      "name": "/repo/src/cart.test.ts",
      "startTime": 1760000000100,
      "endTime": 1760000001600,
      "assertionResults": [
        {"fullName": "cart totals items", "title": "totals items", "status": "passed", "duration": 4},
        {"fullName": "cart applies coupon", "title": "applies coupon", "status": "failed", "duration": 11,
         "failureMessages": ["Error: expect(received).toBe(expected)\nExpected: 90\nReceived: 100\n    at Object.<anonymous> (src/cart.test.ts:31:20)"],
         "location": {"line": 27, "column": 3}},
        {"fullName": "cart handles currency", "title": "handles currency", "status": "pending", "failureMessages": []}
      ]
    }
  ]
}"#;

const JUNIT_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites name="api" time="4.5">
  <testsuite name="OrdersApiTest" tests="3" failures="1" skipped="1" time="4.5">
    <testcase classname="OrdersApiTest" name="createsOrder" time="1.25"/>
    <testcase classname="OrdersApiTest" name="rejectsEmptyCart" time="0.75">
      <failure message="expected 400 but was 500" type="AssertionError">java.lang.AssertionError: expected 400 but was 500
    at OrdersApiTest.rejectsEmptyCart(OrdersApiTest.java:58)</failure>
    </testcase>
    <testcase classname="OrdersApiTest" name="refundsOrder" time="0">
      <skipped/>
    </testcase>
  </testsuite>
</testsuites>"#;

#[test]
fn test_playwright_report_end_to_end() {
    let report = parse_report("results.json", PLAYWRIGHT_REPORT.as_bytes()).unwrap();

    assert_eq!(report.framework, "playwright");
    assert_eq!(report.total_tests, 2);
    assert_eq!(report.failed_tests, 1);
    assert_eq!(report.passed_tests, 1);
    assert_eq!(report.duration_ms, 31250);
    assert!(report.has_failures());
    assert!(report.counts_consistent());

    let failures = report.failed_test_cases();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].name, "[chromium] pays with card");
    assert_eq!(failures[0].location().as_deref(), Some("checkout.spec.ts:14"));
    assert_eq!(failures[0].duration_ms, 30012);
    assert!(failures[0]
        .stack_trace
        .as_deref()
        .unwrap()
        .contains("checkout.spec.ts:22:18"));
}

#[test]
fn test_passing_playwright_report_has_no_failures() {
    let report = parse_report("results.json", PASSING_PLAYWRIGHT_REPORT.as_bytes()).unwrap();
    assert!(!report.has_failures());
    assert!(report.failed_test_cases().is_empty());
}

#[test]
fn test_jest_report_end_to_end() {
    assert_eq!(
        detect_report_content(JEST_REPORT.as_bytes()).report_type,
        ReportType::Jest
    );
    let report = parse_report("jest-results.json", JEST_REPORT.as_bytes()).unwrap();

    assert_eq!(report.framework, "jest");
    assert_eq!(report.total_tests, 3);
    assert_eq!(report.failed_tests, 1);
    assert_eq!(report.skipped_tests, 1);

    let failures = report.failed_test_cases();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].name, "cart applies coupon");
    assert_eq!(
        failures[0].error_message.as_deref(),
        Some("Error: expect(received).toBe(expected)")
    );
    assert_eq!(failures[0].line, Some(27));
}

#[test]
fn test_junit_xml_report_end_to_end() {
    let report = parse_report("TEST-OrdersApiTest.xml", JUNIT_REPORT.as_bytes()).unwrap();

    assert_eq!(report.framework, "junit");
    assert_eq!(report.total_tests, 3);
    assert_eq!(report.failed_tests, 1);
    assert_eq!(report.skipped_tests, 1);
    assert_eq!(report.duration_ms, 4500);

    let suite = &report.suites[0];
    assert_eq!(suite.name, "OrdersApiTest");
    assert_eq!(suite.tests[0].status, TestStatus::Passed);
    assert_eq!(suite.tests[0].duration_ms, 1250);

    let failures = report.failed_test_cases();
    assert_eq!(failures[0].name, "rejectsEmptyCart");
    assert_eq!(
        failures[0].error_message.as_deref(),
        Some("expected 400 but was 500")
    );
    assert!(failures[0]
        .stack_trace
        .as_deref()
        .unwrap()
        .contains("OrdersApiTest.java:58"));
}

#[test]
fn test_junit_json_is_rejected() {
    let err = parse_report("junit.json", br#"{"testsuites": []}"#).unwrap_err();
    assert!(matches!(err, CoreError::Parse(_)));
}

#[test]
fn test_unrecognized_content_is_rejected() {
    for bytes in [&b"{\"hello\": 1}"[..], b"not json", b""] {
        let err = parse_report("report.json", bytes).unwrap_err();
        assert!(matches!(err, CoreError::Parse(_)));
    }
}
