use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use heimdall_core::{GithubConfig, HeimdallError, Result};

/// Pull request metadata needed to build a review snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestDetails {
    /// Pull request number.
    pub number: u64,
    /// Title; GitHub may return null.
    pub title: Option<String>,
    /// Description body; GitHub may return null.
    pub body: Option<String>,
    /// Head ref the PR is built from (used for policy resolution).
    pub head_ref: String,
}

/// A changed file as reported by the pull request files listing.
///
/// GitHub omits `patch` for binary and oversized files.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFile {
    /// Path relative to the repository root.
    pub filename: String,
    /// Change status (`added`, `modified`, `removed`, ...).
    pub status: String,
    /// Added line count.
    #[serde(default)]
    pub additions: u64,
    /// Removed line count.
    #[serde(default)]
    pub deletions: u64,
    /// Unified diff for the file, when textual.
    pub patch: Option<String>,
}

/// Rate-limit headroom reported by the API.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    /// Requests remaining in the current window.
    pub remaining: u64,
    /// Unix timestamp at which the window resets.
    pub reset: u64,
}

/// Narrow source-control contract consumed by the review pipeline.
///
/// The production implementation is [`GitHubClient`]; tests substitute a
/// mock. Rate-limit headroom is best-effort: implementations that cannot
/// observe it return `None`.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Fetch pull request metadata.
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestDetails>;

    /// List the files changed by a pull request.
    async fn list_changed_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<ChangedFile>>;

    /// Fetch the decoded content of a file at `git_ref`.
    ///
    /// Returns `Ok(None)` when the file does not exist at that ref.
    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<String>>;

    /// Post an issue comment; returns the new comment's id.
    async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        issue_number: u64,
        body: &str,
    ) -> Result<u64>;

    /// Replace the body of an existing issue comment.
    async fn update_comment(
        &self,
        owner: &str,
        repo: &str,
        comment_id: u64,
        body: &str,
    ) -> Result<()>;

    /// Last observed rate-limit headroom, if any.
    fn rate_limit(&self) -> Option<RateLimit> {
        None
    }
}

/// GitHub REST client for pull request data and comments.
///
/// Uses octocrab for JSON routes and a raw reqwest client where a custom
/// Accept header is needed (file content). Rate-limit headers seen on raw
/// responses are kept in [`SourceControl::rate_limit`].
///
/// # Examples
///
/// ```no_run
/// use heimdall_core::GithubConfig;
/// use heimdall_github::GitHubClient;
///
/// let config = GithubConfig {
///     token: Some("ghp_xxxx".into()),
///     ..GithubConfig::default()
/// };
/// let client = GitHubClient::new(&config).unwrap();
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
    api_base: String,
    rate_limit: RwLock<Option<RateLimit>>,
}

impl GitHubClient {
    /// Create a client from GitHub configuration.
    ///
    /// The token comes from the configuration or, failing that, the
    /// `GITHUB_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`HeimdallError::Config`] if no token is available, or
    /// [`HeimdallError::Github`] if the client cannot be built.
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let token = match &config.token {
            Some(t) => t.clone(),
            None => std::env::var("GITHUB_TOKEN").map_err(|_| {
                HeimdallError::Config(
                    "GITHUB_TOKEN not set. Configure [github].token or set GITHUB_TOKEN".into(),
                )
            })?,
        };

        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.clone())
            .build()
            .map_err(|e| HeimdallError::Github(format!("failed to create GitHub client: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| HeimdallError::Github(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            octocrab,
            http,
            token,
            api_base: config.api_base.clone(),
            rate_limit: RwLock::new(None),
        })
    }

    async fn get_json(&self, url: &str, accept: &str) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .header("Accept", accept)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "heimdall")
            .send()
            .await
            .map_err(|e| HeimdallError::Github(format!("request failed: {e}")))?;

        self.observe_rate_limit(&response);
        Ok(response)
    }

    fn observe_rate_limit(&self, response: &reqwest::Response) {
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        if let Some(limit) = rate_limit_from_headers(
            header("x-ratelimit-remaining").as_deref(),
            header("x-ratelimit-reset").as_deref(),
        ) {
            debug!(
                remaining = limit.remaining,
                reset = limit.reset,
                "GitHub rate limit headroom"
            );
            if let Ok(mut slot) = self.rate_limit.write() {
                *slot = Some(limit);
            }
        }
    }
}

/// Parse `x-ratelimit-remaining` / `x-ratelimit-reset` header values.
fn rate_limit_from_headers(remaining: Option<&str>, reset: Option<&str>) -> Option<RateLimit> {
    Some(RateLimit {
        remaining: remaining?.parse().ok()?,
        reset: reset?.parse().ok()?,
    })
}

#[async_trait]
impl SourceControl for GitHubClient {
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestDetails> {
        let url = format!("{}/repos/{owner}/{repo}/pulls/{number}", self.api_base);
        let response = self.get_json(&url, "application/vnd.github+json").await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HeimdallError::Github(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| HeimdallError::Github(format!("failed to parse PR response: {e}")))?;

        Ok(PullRequestDetails {
            number: value["number"].as_u64().unwrap_or(number),
            title: value["title"].as_str().map(String::from),
            body: value["body"].as_str().map(String::from),
            head_ref: value["head"]["ref"].as_str().unwrap_or_default().to_string(),
        })
    }

    async fn list_changed_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<ChangedFile>> {
        let mut files = Vec::new();
        let mut page = 1u32;
        loop {
            let url = format!(
                "{}/repos/{owner}/{repo}/pulls/{number}/files?per_page=100&page={page}",
                self.api_base
            );
            let response = self.get_json(&url, "application/vnd.github+json").await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(HeimdallError::Github(format!(
                    "GitHub API error {status}: {body}"
                )));
            }

            let batch: Vec<ChangedFile> = response.json().await.map_err(|e| {
                HeimdallError::Github(format!("failed to parse files response: {e}"))
            })?;

            let done = batch.len() < 100;
            files.extend(batch);
            if done {
                break;
            }
            page += 1;
        }
        Ok(files)
    }

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<String>> {
        let url = format!(
            "{}/repos/{owner}/{repo}/contents/{path}?ref={git_ref}",
            self.api_base
        );
        let response = self.get_json(&url, "application/vnd.github.raw+json").await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HeimdallError::Github(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        let content = response
            .text()
            .await
            .map_err(|e| HeimdallError::Github(format!("failed to read file content: {e}")))?;
        Ok(Some(content))
    }

    async fn create_comment(
        &self,
        owner: &str,
        repo: &str,
        issue_number: u64,
        body: &str,
    ) -> Result<u64> {
        let route = format!("/repos/{owner}/{repo}/issues/{issue_number}/comments");
        let payload = serde_json::json!({ "body": body });

        let response: serde_json::Value = self
            .octocrab
            .post(route, Some(&payload))
            .await
            .map_err(|e| HeimdallError::Github(format!("failed to post comment: {e}")))?;

        response["id"]
            .as_u64()
            .ok_or_else(|| HeimdallError::Github("comment response missing id".into()))
    }

    async fn update_comment(
        &self,
        owner: &str,
        repo: &str,
        comment_id: u64,
        body: &str,
    ) -> Result<()> {
        let route = format!("/repos/{owner}/{repo}/issues/comments/{comment_id}");
        let payload = serde_json::json!({ "body": body });

        let _response: serde_json::Value = self
            .octocrab
            .patch(route, Some(&payload))
            .await
            .map_err(|e| HeimdallError::Github(format!("failed to update comment: {e}")))?;
        Ok(())
    }

    fn rate_limit(&self) -> Option<RateLimit> {
        self.rate_limit.read().ok().and_then(|slot| *slot)
    }
}
