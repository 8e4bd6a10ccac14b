//! Artifact Source
//!
//! The collaborator that owns the CI transport: listing workflow runs and
//! their artifacts, downloading artifact contents, and searching
//! repositories. Discovery only talks to this trait; the root crate provides
//! the GitHub implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by an [`ArtifactSource`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Credentials missing or insufficient
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Repository, run or artifact does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport failure before a response was received
    #[error("Network error: {0}")]
    Network(String),

    /// Downloaded artifact could not be unpacked
    #[error("Archive error: {0}")]
    Archive(String),

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type alias for artifact source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// A CI workflow run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    /// `success`, `failure`, `cancelled`, ... (absent while running)
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub head_branch: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    /// Whether the run concluded with a failure
    pub fn failed(&self) -> bool {
        self.conclusion.as_deref() == Some("failure")
    }
}

/// An artifact attached to a workflow run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size_in_bytes: u64,
    #[serde(default)]
    pub expired: bool,
}

/// One file unpacked from a downloaded artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    /// Path inside the artifact archive
    pub name: String,
    pub contents: Vec<u8>,
}

/// Source of workflow runs and artifacts.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Most recent workflow runs of a repository, newest first.
    async fn list_workflow_runs(&self, repo: &str, limit: usize) -> SourceResult<Vec<WorkflowRun>>;

    /// Artifacts attached to a workflow run.
    async fn list_artifacts(&self, repo: &str, run_id: u64) -> SourceResult<Vec<Artifact>>;

    /// Whether artifact contents can be downloaded (e.g. credentials present).
    fn can_download(&self) -> bool;

    /// Download and unpack an artifact.
    async fn download_artifact(
        &self,
        repo: &str,
        artifact: &Artifact,
    ) -> SourceResult<Vec<ArtifactFile>>;

    /// Repositories (`owner/name`) matching a search query.
    async fn search_repositories(&self, query: &str, limit: usize) -> SourceResult<Vec<String>>;
}
