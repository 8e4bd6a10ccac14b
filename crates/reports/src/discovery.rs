//! Artifact Discovery
//!
//! Walks a repository's recent workflow runs looking for an artifact that
//! holds a recognized test report:
//!
//! 1. List the most recent runs (at most [`MAX_RUNS_TO_SCAN`]).
//! 2. For each run, list its artifacts; skip expired ones and names outside
//!    the report vocabulary.
//! 3. Probe the content of surviving artifacts when the source can download
//!    and the artifact is at most [`MAX_PROBE_ARTIFACT_BYTES`], falling back
//!    to name-based classification otherwise.
//! 4. Stop after the first run that yields at least one recorded artifact.
//!
//! Every artifact considered leaves a [`ProbeRecord`], so skipped and failed
//! probes stay diagnosable.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::detector::{
    detect_report_content, detect_report_name, is_report_file, matches_artifact_name,
};
use crate::models::{ReportCounts, ReportType};
use crate::source::{Artifact, ArtifactSource, SourceError, SourceResult, WorkflowRun};

/// Upper bound on workflow runs inspected per repository.
pub const MAX_RUNS_TO_SCAN: usize = 5;

/// Artifacts larger than this are never downloaded for probing.
pub const MAX_PROBE_ARTIFACT_BYTES: u64 = 100 * 1024 * 1024;

/// Explanation when a repository has no workflow runs.
pub const NO_RUNS_ERROR: &str = "no workflow runs found";

/// Explanation when the scan found nothing usable.
pub const NO_ARTIFACTS_ERROR: &str = "no compatible test artifacts found";

// ============================================================================
// Records
// ============================================================================

/// How an artifact's report type was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Downloaded and classified by content
    Content,
    /// Classified from the artifact name only
    Name,
}

/// A candidate artifact found during discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDiscoveryResult {
    pub artifact_id: u64,
    pub artifact_name: String,
    pub report_type: ReportType,
    /// File inside the artifact that was classified (content detection only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    pub run_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_conclusion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tests: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_tests: Option<u64>,
    /// From the report counts when known, otherwise the run conclusion
    pub has_failures: bool,
    pub detection: DetectionMethod,
}

/// What happened to one artifact (or one run listing) during the scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Recorded(DetectionMethod),
    SkippedExpired,
    SkippedName,
    /// Too large to probe and the name did not classify it (size in bytes)
    SkippedTooLarge(u64),
    Unclassified,
    ProbeFailed(String),
    ListingFailed(String),
}

/// Per-item outcome of the discovery scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub run_id: u64,
    /// Absent for run-level records (artifact listing failures)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_name: Option<String>,
    pub outcome: ProbeOutcome,
    /// Download error that forced a fallback to name-based classification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_error: Option<String>,
}

impl ProbeRecord {
    fn artifact(run: &WorkflowRun, artifact: &Artifact, outcome: ProbeOutcome) -> Self {
        Self {
            run_id: run.id,
            artifact_id: Some(artifact.id),
            artifact_name: Some(artifact.name.clone()),
            outcome,
            probe_error: None,
        }
    }

    fn listing_failed(run: &WorkflowRun, reason: String) -> Self {
        Self {
            run_id: run.id,
            artifact_id: None,
            artifact_name: None,
            outcome: ProbeOutcome::ListingFailed(reason),
            probe_error: None,
        }
    }
}

/// Compatibility verdict for one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoDiscoveryResult {
    pub repository: String,
    pub compatible: bool,
    pub runs_scanned: usize,
    pub artifacts: Vec<ArtifactDiscoveryResult>,
    pub probes: Vec<ProbeRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RepoDiscoveryResult {
    fn incompatible(repository: &str, error: impl Into<String>) -> Self {
        Self {
            repository: repository.to_string(),
            compatible: false,
            runs_scanned: 0,
            artifacts: Vec::new(),
            probes: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// The artifact analysis should use: the first one recorded.
    pub fn best_artifact(&self) -> Option<&ArtifactDiscoveryResult> {
        self.artifacts.first()
    }
}

// ============================================================================
// Scan
// ============================================================================

/// Race a source call against cancellation.
pub async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = SourceResult<T>>,
) -> SourceResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SourceError::Cancelled),
        result = fut => result,
    }
}

/// Discover a compatible report artifact in one repository.
///
/// Failing to list workflow runs is returned as an error; everything past
/// that point degrades into [`ProbeRecord`]s.
pub async fn discover_repository(
    source: &dyn ArtifactSource,
    repo: &str,
    cancel: &CancellationToken,
) -> SourceResult<RepoDiscoveryResult> {
    let mut runs = cancellable(cancel, source.list_workflow_runs(repo, MAX_RUNS_TO_SCAN)).await?;
    runs.truncate(MAX_RUNS_TO_SCAN);

    if runs.is_empty() {
        info!(repo, "no workflow runs found");
        return Ok(RepoDiscoveryResult::incompatible(repo, NO_RUNS_ERROR));
    }

    let mut result = RepoDiscoveryResult {
        repository: repo.to_string(),
        compatible: false,
        runs_scanned: 0,
        artifacts: Vec::new(),
        probes: Vec::new(),
        error: None,
    };

    for run in &runs {
        result.runs_scanned += 1;

        let artifacts = match cancellable(cancel, source.list_artifacts(repo, run.id)).await {
            Ok(artifacts) => artifacts,
            Err(SourceError::Cancelled) => return Err(SourceError::Cancelled),
            Err(e) => {
                warn!(repo, run_id = run.id, error = %e, "failed to list artifacts");
                result.probes.push(ProbeRecord::listing_failed(run, e.to_string()));
                continue;
            }
        };

        let recorded_before = result.artifacts.len();
        for artifact in &artifacts {
            let (record, found) = examine_artifact(source, repo, run, artifact, cancel).await?;
            debug!(
                repo,
                run_id = run.id,
                artifact = %artifact.name,
                outcome = ?record.outcome,
                "examined artifact"
            );
            result.probes.push(record);
            result.artifacts.extend(found);
        }

        if result.artifacts.len() > recorded_before {
            break;
        }
    }

    result.compatible = !result.artifacts.is_empty();
    if !result.compatible {
        result.error = Some(NO_ARTIFACTS_ERROR.to_string());
    }
    info!(
        repo,
        compatible = result.compatible,
        runs_scanned = result.runs_scanned,
        artifacts = result.artifacts.len(),
        "repository discovery finished"
    );
    Ok(result)
}

/// Classify one artifact. Only cancellation is returned as an error.
async fn examine_artifact(
    source: &dyn ArtifactSource,
    repo: &str,
    run: &WorkflowRun,
    artifact: &Artifact,
    cancel: &CancellationToken,
) -> SourceResult<(ProbeRecord, Option<ArtifactDiscoveryResult>)> {
    if artifact.expired {
        return Ok((
            ProbeRecord::artifact(run, artifact, ProbeOutcome::SkippedExpired),
            None,
        ));
    }
    if !matches_artifact_name(&artifact.name) {
        return Ok((
            ProbeRecord::artifact(run, artifact, ProbeOutcome::SkippedName),
            None,
        ));
    }

    let mut probe_error = None;
    let oversized = artifact.size_in_bytes > MAX_PROBE_ARTIFACT_BYTES;
    if oversized {
        debug!(
            repo,
            artifact = %artifact.name,
            size = artifact.size_in_bytes,
            "artifact too large to probe, classifying by name"
        );
    } else if source.can_download() {
        match cancellable(cancel, source.download_artifact(repo, artifact)).await {
            Ok(files) => {
                let hit = files
                    .iter()
                    .filter(|f| is_report_file(&f.name))
                    .map(|f| (f, detect_report_content(&f.contents)))
                    .find(|(_, d)| d.report_type.is_known());
                if let Some((file, detection)) = hit {
                    let found = content_result(
                        run,
                        artifact,
                        &file.name,
                        detection.report_type,
                        detection.counts,
                    );
                    let outcome = ProbeOutcome::Recorded(DetectionMethod::Content);
                    return Ok((ProbeRecord::artifact(run, artifact, outcome), Some(found)));
                }
            }
            Err(SourceError::Cancelled) => return Err(SourceError::Cancelled),
            Err(e) => {
                warn!(repo, artifact = %artifact.name, error = %e, "artifact probe failed");
                probe_error = Some(e.to_string());
            }
        }
    }

    let report_type = detect_report_name(&artifact.name);
    if !report_type.is_known() {
        let outcome = match probe_error.take() {
            Some(reason) => ProbeOutcome::ProbeFailed(reason),
            None if oversized => ProbeOutcome::SkippedTooLarge(artifact.size_in_bytes),
            None => ProbeOutcome::Unclassified,
        };
        return Ok((ProbeRecord::artifact(run, artifact, outcome), None));
    }

    let found = ArtifactDiscoveryResult {
        artifact_id: artifact.id,
        artifact_name: artifact.name.clone(),
        report_type,
        source_file: None,
        run_id: run.id,
        run_conclusion: run.conclusion.clone(),
        total_tests: None,
        failed_tests: None,
        has_failures: run.failed(),
        detection: DetectionMethod::Name,
    };
    let outcome = ProbeOutcome::Recorded(DetectionMethod::Name);
    let mut record = ProbeRecord::artifact(run, artifact, outcome);
    record.probe_error = probe_error;
    Ok((record, Some(found)))
}

fn content_result(
    run: &WorkflowRun,
    artifact: &Artifact,
    file_name: &str,
    report_type: ReportType,
    counts: Option<ReportCounts>,
) -> ArtifactDiscoveryResult {
    ArtifactDiscoveryResult {
        artifact_id: artifact.id,
        artifact_name: artifact.name.clone(),
        report_type,
        source_file: Some(file_name.to_string()),
        run_id: run.id,
        run_conclusion: run.conclusion.clone(),
        total_tests: counts.map(|c| c.total),
        failed_tests: counts.map(|c| c.failed),
        has_failures: counts.map(|c| c.has_failures()).unwrap_or_else(|| run.failed()),
        detection: DetectionMethod::Content,
    }
}

/// Batch discovery over repositories matching a search query.
///
/// Search failure and cancellation abort the batch; per-repository failures
/// become incompatible records.
pub async fn discover_repositories(
    source: &dyn ArtifactSource,
    query: &str,
    limit: usize,
    cancel: &CancellationToken,
) -> SourceResult<Vec<RepoDiscoveryResult>> {
    let repos = cancellable(cancel, source.search_repositories(query, limit)).await?;
    info!(query, candidates = repos.len(), "discovering repositories");

    let mut results = Vec::with_capacity(repos.len());
    for repo in &repos {
        match discover_repository(source, repo, cancel).await {
            Ok(result) => results.push(result),
            Err(SourceError::Cancelled) => return Err(SourceError::Cancelled),
            Err(e) => {
                warn!(repo = %repo, error = %e, "repository discovery failed");
                results.push(RepoDiscoveryResult::incompatible(repo, e.to_string()));
            }
        }
    }
    Ok(results)
}
