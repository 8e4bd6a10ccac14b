//! Discovered Report Loading
//!
//! Connects discovery to analysis: downloads the artifact chosen by
//! discovery and parses its report file into a [`Report`].

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use failscope_core::CoreError;
use failscope_reports::discovery::cancellable;
use failscope_reports::{
    is_report_file, is_xml_report_file, parse_report, Artifact, ArtifactDiscoveryResult,
    ArtifactFile, ArtifactSource, Report,
};

use crate::utils::error::{AppError, AppResult};

/// Order in which files are tried: the file discovery matched, then JSON
/// report files, then XML files.
fn candidate_files<'a>(
    files: &'a [ArtifactFile],
    source_file: Option<&str>,
) -> Vec<&'a ArtifactFile> {
    let mut ordered: Vec<&ArtifactFile> = Vec::new();
    if let Some(wanted) = source_file {
        ordered.extend(files.iter().filter(|f| f.name == wanted));
    }
    ordered.extend(
        files
            .iter()
            .filter(|f| Some(f.name.as_str()) != source_file && is_report_file(&f.name)),
    );
    ordered.extend(
        files
            .iter()
            .filter(|f| Some(f.name.as_str()) != source_file && is_xml_report_file(&f.name)),
    );
    ordered
}

/// Parse the first usable report among an artifact's files.
pub fn report_from_files(files: &[ArtifactFile], source_file: Option<&str>) -> AppResult<Report> {
    let mut last_error = None;
    for file in candidate_files(files, source_file) {
        match parse_report(&file.name, &file.contents) {
            Ok(report) => {
                debug!(file = %file.name, framework = %report.framework, "parsed artifact report");
                return Ok(report);
            }
            Err(e) => {
                debug!(file = %file.name, error = %e, "artifact file is not a usable report");
                last_error = Some(e);
            }
        }
    }
    Err(AppError::Core(last_error.unwrap_or_else(|| {
        CoreError::not_found("no report file found in artifact")
    })))
}

/// Download a discovered artifact and parse its report.
pub async fn load_discovered_report(
    source: &dyn ArtifactSource,
    repo: &str,
    discovered: &ArtifactDiscoveryResult,
    cancel: &CancellationToken,
) -> AppResult<Report> {
    let artifact = Artifact {
        id: discovered.artifact_id,
        name: discovered.artifact_name.clone(),
        size_in_bytes: 0,
        expired: false,
    };
    let files = cancellable(cancel, source.download_artifact(repo, &artifact)).await?;
    info!(
        repo,
        artifact = %artifact.name,
        files = files.len(),
        "downloaded discovered artifact"
    );
    report_from_files(&files, discovered.source_file.as_deref())
}
