//! Extraction Integration Tests
//!
//! Feeds realistic model answers through the extractor and the argument-bag
//! mapping.

use serde_json::json;

use failscope_analysis::{
    extract_json_object, parse_diagnosis, rca_from_arguments, Confidence, Diagnosis,
    EvidenceType, ExtractionError,
};

#[test]
fn test_answer_with_preamble_and_json_fence() {
    let answer = r#"I looked at the failing checkout tests. The timeouts all happen after the payment iframe is requested.

```json
{
  "root_cause": "The payment iframe is blocked by the test environment's CSP header",
  "evidence": [
    "Test timeout of 30000ms exceeded",
    "Refused to frame 'https://pay.example.com' because of Content-Security-Policy"
  ],
  "suggested_fix": "Add pay.example.com to frame-src in the staging CSP",
  "confidence": "High",
  "confidence_explanation": "Both failures stop at the same frame load"
}
```

Let me know if you need more detail."#;

    let diagnosis = parse_diagnosis(answer).unwrap();
    assert_eq!(diagnosis.evidence.len(), 2);
    assert_eq!(diagnosis.confidence, Confidence::High);
    assert!(diagnosis.suggested_fix.contains("frame-src"));
}

#[test]
fn test_json_with_braces_in_strings_and_no_fence() {
    let answer = r#"Diagnosis: {"root_cause": "Template literal `${user}` renders as {undefined}", "evidence": ["expected \"Hello {name}\""], "suggested_fix": "Pass the user fixture", "confidence": "LOW"} -- end"#;

    let diagnosis = parse_diagnosis(answer).unwrap();
    assert_eq!(
        diagnosis.root_cause,
        "Template literal `${user}` renders as {undefined}"
    );
    assert_eq!(diagnosis.evidence[0], "expected \"Hello {name}\"");
    assert_eq!(diagnosis.confidence, Confidence::Low);
}

#[test]
fn test_unknown_confidence_defaults_to_medium() {
    let diagnosis = parse_diagnosis(r#"{"root_cause": "x", "confidence": "certain"}"#).unwrap();
    assert_eq!(diagnosis.confidence, Confidence::Medium);
    assert!(diagnosis.confidence_explanation.is_none());
}

#[test]
fn test_prose_only_answer_fails_and_falls_back() {
    let answer = "The tests are flaky because the network is slow.";
    assert_eq!(extract_json_object(answer), None);
    assert_eq!(parse_diagnosis(answer), Err(ExtractionError::NoJsonFound));

    let fallback = Diagnosis::fallback(answer);
    let json = serde_json::to_value(&fallback).unwrap();
    assert_eq!(json["root_cause"], answer);
    assert_eq!(json["confidence"], "LOW");
    assert_eq!(json["evidence"], json!([]));
}

#[test]
fn test_tool_arguments_map_to_rca() {
    let args = json!({
        "title": "Orders API returns 500 on empty cart",
        "failure_type": "assertion",
        "location": {"file": "OrdersApiTest.java", "line": 58, "function": "rejectsEmptyCart"},
        "symptom": "expected 400 but was 500",
        "root_cause": "Validation runs after the database insert",
        "evidence": [
            {"type": "code", "content": "OrdersApiTest.java:58"},
            {"type": "video", "content": "recording.webm"}
        ],
        "remediation": "Validate the cart before persisting",
        "confidence": 77.6,
        "sensitivity": "MEDIUM"
    });

    let extracted = rca_from_arguments(&args).unwrap();
    let location = extracted.rca.location.as_ref().unwrap();
    assert_eq!(location.file_path, "OrdersApiTest.java");
    assert_eq!(location.line_number, 58);
    assert_eq!(location.function_name, "rejectsEmptyCart");
    assert_eq!(extracted.rca.evidence[0].evidence_type, EvidenceType::Code);
    // Unknown evidence kinds are kept as logs
    assert_eq!(extracted.rca.evidence[1].evidence_type, EvidenceType::Log);
    assert_eq!(extracted.confidence, 78);

    let rendered = serde_json::to_value(&extracted.rca).unwrap();
    assert_eq!(rendered["location"]["line_number"], 58);
    assert_eq!(rendered["evidence"][0]["type"], "code");
}
