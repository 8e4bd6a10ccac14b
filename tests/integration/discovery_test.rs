//! Discovery Integration Tests
//!
//! Runs the bounded discovery scan over an in-memory source serving real zip
//! archives, then loads and analyzes the discovered report.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use failscope::services::discovery::load_discovered_report;
use failscope::{Analyzer, AnalyzerConfig};
use failscope_reports::{
    discover_repositories, discover_repository, DetectionMethod, ProbeOutcome, ReportType,
};

use super::support::{
    artifact, run, text_response, zip_bytes, ScriptedProvider, ZipSource, PLAYWRIGHT_REPORT,
};

fn shop_source() -> ZipSource {
    let mut source = ZipSource {
        downloadable: true,
        ..Default::default()
    };
    source.runs.insert(
        "acme/shop".to_string(),
        vec![run(30, "success"), run(29, "failure")],
    );
    source
        .artifacts
        .insert(30, vec![artifact(300, "coverage"), artifact(301, "build-logs")]);
    source.artifacts.insert(
        29,
        vec![
            artifact(290, "playwright-report"),
            artifact(291, "blob-report-2"),
        ],
    );
    source.archives.insert(
        290,
        zip_bytes(&[
            ("index.html", "<html></html>"),
            ("data/results.json", PLAYWRIGHT_REPORT),
        ]),
    );
    source
        .archives
        .insert(291, zip_bytes(&[("report.zip.txt", "not a report")]));
    source
}

#[tokio::test]
async fn test_discovers_report_in_second_run() {
    let source = shop_source();
    let result = discover_repository(&source, "acme/shop", &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.compatible);
    assert!(result.error.is_none());
    assert_eq!(result.runs_scanned, 2);

    let best = result.best_artifact().unwrap();
    assert_eq!(best.artifact_name, "playwright-report");
    assert_eq!(best.report_type, ReportType::Playwright);
    assert_eq!(best.detection, DetectionMethod::Content);
    assert_eq!(best.source_file.as_deref(), Some("data/results.json"));
    assert_eq!(best.total_tests, Some(2));
    assert_eq!(best.failed_tests, Some(1));
    assert!(best.has_failures);

    // The blob artifact had no parseable report and fell back to its name
    let blob = &result.artifacts[1];
    assert_eq!(blob.detection, DetectionMethod::Name);
    assert!(blob.has_failures);

    let skipped: Vec<_> = result
        .probes
        .iter()
        .filter(|p| p.outcome == ProbeOutcome::SkippedName)
        .collect();
    assert_eq!(skipped.len(), 2);
}

#[tokio::test]
async fn test_discovered_report_flows_into_analysis() {
    let source = shop_source();
    let cancel = CancellationToken::new();
    let discovery = discover_repository(&source, "acme/shop", &cancel)
        .await
        .unwrap();
    let best = discovery.best_artifact().unwrap();

    let report = load_discovered_report(&source, "acme/shop", best, &cancel)
        .await
        .unwrap();
    assert_eq!(report.failed_tests, 1);

    let provider = Arc::new(ScriptedProvider::new(
        vec![text_response(
            r#"{"root_cause": "Card iframe never loads", "evidence": [], "suggested_fix": "Wait for the iframe", "confidence": "MEDIUM"}"#,
        )],
        false,
    ));
    let analyzer = Analyzer::new(provider.clone(), AnalyzerConfig::default());
    let outcome = analyzer.analyze(&report, &cancel).await.unwrap();

    assert!(outcome.is_analyzed());
    assert_eq!(provider.call_count(), 1);
    let prompts = provider.prompts.lock().unwrap();
    assert!(prompts[0].contains("[chromium] pays with card"));
    assert!(prompts[0].contains("Location: checkout.spec.ts:14"));
}

#[tokio::test]
async fn test_name_only_discovery_without_token() {
    let mut source = shop_source();
    source.downloadable = false;

    let result = discover_repository(&source, "acme/shop", &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.compatible);
    assert_eq!(source.downloads.load(Ordering::SeqCst), 0);
    let best = result.best_artifact().unwrap();
    assert_eq!(best.detection, DetectionMethod::Name);
    assert_eq!(best.total_tests, None);
    assert_eq!(best.run_conclusion.as_deref(), Some("failure"));
    assert!(best.has_failures);
}

#[tokio::test]
async fn test_batch_records_per_repository_failures() {
    let mut source = shop_source();
    source.repositories = vec!["acme/shop".to_string(), "acme/missing".to_string()];

    let results = discover_repositories(&source, "topic:e2e", 10, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].compatible);
    assert!(!results[1].compatible);
    assert!(results[1].error.is_some());
}

#[tokio::test]
async fn test_cancelled_discovery() {
    let source = shop_source();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = discover_repository(&source, "acme/shop", &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, failscope_reports::SourceError::Cancelled);
}
