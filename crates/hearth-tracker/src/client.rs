//! Hosting service client boundary.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use hearth_core::config::defaults;

/// Errors raised by the hosting client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport or decode failure
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
}

/// Metadata snapshot of one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub id: u64,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stargazers_count: u64,
    pub watchers_count: u64,
    pub forks_count: u64,
    pub default_branch: String,
    pub updated_at: DateTime<Utc>,
}

/// One published release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseSnapshot {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub tag_name: String,
    pub html_url: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub prerelease: bool,
}

/// Read access to the hosting service, one method per data kind.
#[async_trait]
pub trait HostingApi: Send + Sync + 'static {
    /// Fetch repository metadata.
    async fn repository(&self, repository: &str) -> Result<RepositorySnapshot, ClientError>;

    /// Fetch releases, newest first. An empty list is a valid result.
    async fn releases(&self, repository: &str) -> Result<Vec<ReleaseSnapshot>, ClientError>;
}

/// reqwest implementation of [`HostingApi`] against a REST surface
/// (`GET /repos/{repository}`, `GET /repos/{repository}/releases`).
pub struct RestHostingClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RestHostingClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(defaults::HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(http, base_url, token))
    }

    /// Build on an existing HTTP client (test seam).
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl HostingApi for RestHostingClient {
    async fn repository(&self, repository: &str) -> Result<RepositorySnapshot, ClientError> {
        self.get(&format!("/repos/{repository}")).await
    }

    async fn releases(&self, repository: &str) -> Result<Vec<ReleaseSnapshot>, ClientError> {
        self.get(&format!("/repos/{repository}/releases?per_page=1"))
            .await
    }
}
