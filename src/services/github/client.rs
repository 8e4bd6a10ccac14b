//! GitHub Artifact Source
//!
//! [`ArtifactSource`] over the GitHub REST API: workflow runs, run
//! artifacts, artifact zip downloads and repository search.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use failscope_core::ProxyConfig;
use failscope_llm::build_http_client;
use failscope_reports::{
    Artifact, ArtifactFile, ArtifactSource, SourceError, SourceResult, WorkflowRun,
};

use super::archive::unpack_zip;
use crate::models::settings::GitHubConfig;
use crate::utils::error::{AppError, AppResult};

const USER_AGENT: &str = concat!("failscope/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
/// GitHub caps `per_page` at 100.
const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct WorkflowRunsPage {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Deserialize)]
struct ArtifactsPage {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// GitHub REST API client
#[derive(Debug, Clone)]
pub struct GitHubSource {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubSource {
    /// Create a client from the GitHub settings and optional proxy.
    pub fn new(config: &GitHubConfig, proxy: Option<&ProxyConfig>) -> AppResult<Self> {
        let client = build_http_client(proxy).map_err(|e| AppError::config(e.to_string()))?;
        Url::parse(&config.api_url)
            .map_err(|e| AppError::config(format!("Invalid GitHub API URL: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    /// Compose an endpoint URL from a path below the API root.
    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> SourceResult<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.api_url, path.trim_start_matches('/')))
            .map_err(|e| SourceError::Network(format!("invalid URL for {}: {}", path, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get(&self, url: Url) -> SourceResult<Response> {
        debug!(url = %url, "github request");
        let mut request = self
            .client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_status(status, &body, url.path()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> SourceResult<T> {
        let response = self.get(url).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::Network(format!("invalid response body: {}", e)))
    }
}

/// Map a non-success status onto the source error taxonomy.
fn map_status(status: StatusCode, body: &str, path: &str) -> SourceError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::PermissionDenied(message),
        StatusCode::NOT_FOUND => SourceError::NotFound(path.to_string()),
        _ => SourceError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl ArtifactSource for GitHubSource {
    async fn list_workflow_runs(
        &self,
        repo: &str,
        limit: usize,
    ) -> SourceResult<Vec<WorkflowRun>> {
        let per_page = limit.clamp(1, MAX_PER_PAGE);
        let url = self.endpoint(
            &format!("repos/{}/actions/runs", repo),
            &[("per_page", per_page.to_string())],
        )?;
        let page: WorkflowRunsPage = self.get_json(url).await?;
        Ok(page.workflow_runs)
    }

    async fn list_artifacts(&self, repo: &str, run_id: u64) -> SourceResult<Vec<Artifact>> {
        let url = self.endpoint(
            &format!("repos/{}/actions/runs/{}/artifacts", repo, run_id),
            &[("per_page", MAX_PER_PAGE.to_string())],
        )?;
        let page: ArtifactsPage = self.get_json(url).await?;
        Ok(page.artifacts)
    }

    fn can_download(&self) -> bool {
        self.token.is_some()
    }

    async fn download_artifact(
        &self,
        repo: &str,
        artifact: &Artifact,
    ) -> SourceResult<Vec<ArtifactFile>> {
        if !self.can_download() {
            return Err(SourceError::PermissionDenied(
                "downloading artifacts requires a GitHub token".to_string(),
            ));
        }
        let url = self.endpoint(
            &format!("repos/{}/actions/artifacts/{}/zip", repo, artifact.id),
            &[],
        )?;
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        debug!(repo, artifact = %artifact.name, bytes = bytes.len(), "downloaded artifact");
        unpack_zip(&bytes)
    }

    async fn search_repositories(&self, query: &str, limit: usize) -> SourceResult<Vec<String>> {
        let url = self.endpoint(
            "search/repositories",
            &[
                ("q", query.to_string()),
                ("per_page", limit.clamp(1, MAX_PER_PAGE).to_string()),
            ],
        )?;
        let page: SearchPage = self.get_json(url).await?;
        Ok(page
            .items
            .into_iter()
            .take(limit)
            .map(|item| item.full_name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(token: Option<&str>) -> GitHubSource {
        let config = GitHubConfig {
            api_url: "https://ghe.example.com/api/v3/".to_string(),
            token: token.map(|t| t.to_string()),
            ..Default::default()
        };
        GitHubSource::new(&config, None).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_api_prefix() {
        let url = source(None)
            .endpoint(
                "repos/acme/shop/actions/runs",
                &[("per_page", "5".to_string())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/acme/shop/actions/runs?per_page=5"
        );
    }

    #[test]
    fn test_search_query_is_encoded() {
        let url = source(None)
            .endpoint("search/repositories", &[("q", "playwright language:ts".to_string())])
            .unwrap();
        assert!(url.as_str().ends_with("q=playwright+language%3Ats"));
    }

    #[test]
    fn test_can_download_requires_token() {
        assert!(!source(None).can_download());
        assert!(!source(Some("  ")).can_download());
        assert!(source(Some("ghp_x")).can_download());
    }

    #[tokio::test]
    async fn test_download_without_token_is_permission_denied() {
        let artifact = Artifact {
            id: 7,
            name: "playwright-report".to_string(),
            size_in_bytes: 10,
            expired: false,
        };
        let err = source(None)
            .download_artifact("acme/shop", &artifact)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::PermissionDenied(_)));
    }

    #[test]
    fn test_map_status() {
        let err = map_status(
            StatusCode::FORBIDDEN,
            r#"{"message": "Resource not accessible by integration"}"#,
            "/repos/a/b",
        );
        assert_eq!(
            err,
            SourceError::PermissionDenied("Resource not accessible by integration".to_string())
        );
        assert_eq!(
            map_status(StatusCode::NOT_FOUND, "", "/repos/a/b"),
            SourceError::NotFound("/repos/a/b".to_string())
        );
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, "upstream", "/x"),
            SourceError::Http { status: 502, .. }
        ));
    }
}
