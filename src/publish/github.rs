use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Publication, PublishError, Publisher};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Where the digest lands on the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Open a new issue per digest.
    NewIssue,
    /// Comment on an existing issue.
    Comment { issue_number: u64 },
}

/// Publishes digests through the GitHub REST API.
pub struct GitHubPublisher {
    client: reqwest::Client,
    api_url: String,
    repo: String,
    token: SecretString,
    target: Target,
    labels: Vec<String>,
    timeout: Duration,
}

impl GitHubPublisher {
    /// `repo` is `owner/name`.
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        repo: impl Into<String>,
        token: SecretString,
        target: Target,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            repo: repo.into(),
            token,
            target,
            labels: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends `body` and decodes the reply. The whole exchange, body read
    /// included, is bounded by the publisher timeout.
    async fn post<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<CreatedResponse, PublishError> {
        tokio::time::timeout(self.timeout, self.exchange(url, body))
            .await
            .map_err(|_| PublishError::Timeout)?
    }

    async fn exchange<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<CreatedResponse, PublishError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.expose_secret())
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .header(
                reqwest::header::USER_AGENT,
                concat!("bionews/", env!("CARGO_PKG_VERSION")),
            )
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl Publisher for GitHubPublisher {
    async fn publish(&self, title: &str, body: &str) -> Result<Publication, PublishError> {
        let created = match self.target {
            Target::NewIssue => {
                let url = format!("{}/repos/{}/issues", self.api_url, self.repo);
                self.post(
                    &url,
                    &CreateIssue {
                        title,
                        body,
                        labels: &self.labels,
                    },
                )
                .await?
            }
            Target::Comment { issue_number } => {
                let url = format!(
                    "{}/repos/{}/issues/{}/comments",
                    self.api_url, self.repo, issue_number
                );
                self.post(&url, &CreateComment { body }).await?
            }
        };

        tracing::info!(repo = %self.repo, url = %created.html_url, "Published digest");
        Ok(Publication {
            url: created.html_url,
            id: created.number.unwrap_or(created.id),
        })
    }
}

#[derive(Serialize)]
struct CreateIssue<'a> {
    title: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "no_labels")]
    labels: &'a [String],
}

fn no_labels(labels: &&[String]) -> bool {
    labels.is_empty()
}

#[derive(Serialize)]
struct CreateComment<'a> {
    body: &'a str,
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: u64,
    /// Present on issues, absent on comments.
    number: Option<u64>,
    html_url: String,
}
