//! Failscope Reports
//!
//! Everything between raw CI artifacts and a normalized test report:
//!
//! - `models` - Report tree (`Report`, `TestSuite`, `TestCase`) and `ReportType`
//! - `detector` - Content- and name-based report-type detection
//! - `parsers` - Playwright / Jest JSON and JUnit XML parsers (`parse_report`)
//! - `source` - The `ArtifactSource` collaborator trait and its records
//! - `discovery` - Bounded scan of recent workflow runs for a usable report

pub mod detector;
pub mod discovery;
pub mod models;
pub mod parsers;
pub mod source;

// Re-export core model types
pub use models::{Report, ReportCounts, ReportType, TestCase, TestStatus, TestSuite};

// Re-export detector
pub use detector::{
    detect_report_content, detect_report_name, is_report_file, is_xml_report_file,
    matches_artifact_name, Detection,
};

// Re-export parsers
pub use parsers::parse_report;

// Re-export discovery types
pub use discovery::{
    discover_repositories, discover_repository, ArtifactDiscoveryResult, DetectionMethod,
    ProbeOutcome, ProbeRecord, RepoDiscoveryResult, MAX_PROBE_ARTIFACT_BYTES, MAX_RUNS_TO_SCAN,
};
pub use source::{Artifact, ArtifactFile, ArtifactSource, SourceError, SourceResult, WorkflowRun};
