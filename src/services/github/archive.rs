//! Artifact Archive Unpacking
//!
//! GitHub serves artifacts as zip archives; this turns the report candidates
//! of one into [`ArtifactFile`]s. Screenshots, videos and traces are never
//! read.

use std::io::{Cursor, Read};

use tracing::{debug, warn};

use failscope_reports::{
    is_report_file, is_xml_report_file, ArtifactFile, SourceError, SourceResult,
};

/// Files larger than this are skipped.
pub const MAX_ARCHIVE_FILE_BYTES: u64 = 50 * 1024 * 1024;
/// Upper bound on bytes unpacked from one archive.
pub const MAX_ARCHIVE_TOTAL_BYTES: u64 = 200 * 1024 * 1024;

fn is_report_candidate(name: &str) -> bool {
    is_report_file(name) || is_xml_report_file(name)
}

/// Unpack the report candidates (JSON report files and XML) of a zip archive
/// held in memory.
pub fn unpack_zip(bytes: &[u8]) -> SourceResult<Vec<ArtifactFile>> {
    unpack_with_limits(bytes, MAX_ARCHIVE_FILE_BYTES, MAX_ARCHIVE_TOTAL_BYTES)
}

fn unpack_with_limits(
    bytes: &[u8],
    max_file_bytes: u64,
    max_total_bytes: u64,
) -> SourceResult<Vec<ArtifactFile>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| SourceError::Archive(format!("Failed to read artifact as ZIP: {}", e)))?;

    let mut files = Vec::new();
    let mut budget = max_total_bytes;
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|e| SourceError::Archive(format!("Failed to read entry {}: {}", index, e)))?;

        if entry.is_dir() || !is_report_candidate(entry.name()) {
            continue;
        }
        let name = entry.name().to_string();
        if entry.size() > max_file_bytes {
            warn!(file = %name, size = entry.size(), "skipping oversized artifact file");
            continue;
        }
        if entry.size() > budget {
            warn!(file = %name, size = entry.size(), "archive unpack limit reached");
            break;
        }

        // Declared sizes can lie; `take` enforces the limit on what is read.
        let limit = max_file_bytes.min(budget);
        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry
            .take(limit)
            .read_to_end(&mut contents)
            .map_err(|e| SourceError::Archive(format!("Failed to read {}: {}", name, e)))?;

        budget = budget.saturating_sub(contents.len() as u64);
        files.push(ArtifactFile { name, contents });
    }

    debug!(
        files = files.len(),
        bytes = max_total_bytes - budget,
        "unpacked artifact"
    );
    Ok(files)
}
