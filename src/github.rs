//! GitHub REST calls used to publish the manifest and report failures
//!
//! Every call is fatal on a non-2xx answer: there is no retry here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::config::RepoCoordinates;
use crate::error::{Result, SyncError};

const API_TIMEOUT: Duration = Duration::from_secs(60);
const ISSUES_PER_PAGE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// The hosting operations the sync run depends on
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Open a pull request and return its number
    async fn create_pull_request(&self, title: &str, head: &str, base: &str) -> Result<u64>;

    async fn approve_pull_request(&self, number: u64) -> Result<()>;

    /// Squash-merge a pull request
    async fn merge_pull_request(&self, number: u64, commit_title: &str) -> Result<()>;

    /// Delete a ref such as `heads/<branch>`
    async fn delete_ref(&self, git_ref: &str) -> Result<()>;

    /// All open issues of the repository
    async fn list_issues(&self) -> Result<Vec<Issue>>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    repo: RepoCoordinates,
}

#[derive(Deserialize)]
struct CreatedPullRequest {
    number: u64,
}

impl GitHubClient {
    pub fn new(base_url: &str, repo: RepoCoordinates, token: &SecretString) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| SyncError::Config(format!("invalid token header value: {e}")))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(crate::USER_AGENT)
            .timeout(API_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            repo,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!(
            "{}/repos/{}/{}{path}",
            self.base_url, self.repo.owner, self.repo.name
        );
        debug!("{method} {url}");
        self.client.request(method, url)
    }

    /// Send a request and turn non-2xx answers into [`SyncError::Publish`]
    async fn send(&self, action: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|source| SyncError::Http {
            action: action.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Publish {
            action: action.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn json<T: DeserializeOwned>(action: &str, response: Response) -> Result<T> {
        response.json().await.map_err(|source| SyncError::Http {
            action: action.to_string(),
            source,
        })
    }
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn create_pull_request(&self, title: &str, head: &str, base: &str) -> Result<u64> {
        let request = self
            .request(Method::POST, "/pulls")
            .json(&json!({ "title": title, "head": head, "base": base }));
        let response = self.send("create pull request", request).await?;
        let created: CreatedPullRequest = Self::json("create pull request", response).await?;
        info!("Submitted PR number: {}", created.number);
        Ok(created.number)
    }

    async fn approve_pull_request(&self, number: u64) -> Result<()> {
        let request = self
            .request(Method::POST, &format!("/pulls/{number}/reviews"))
            .json(&json!({ "event": "APPROVE" }));
        self.send("approve pull request", request).await?;
        Ok(())
    }

    async fn merge_pull_request(&self, number: u64, commit_title: &str) -> Result<()> {
        let request = self
            .request(Method::PUT, &format!("/pulls/{number}/merge"))
            .json(&json!({ "commit_title": commit_title, "merge_method": "squash" }));
        self.send("merge pull request", request).await?;
        Ok(())
    }

    async fn delete_ref(&self, git_ref: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &format!("/git/refs/{git_ref}"));
        self.send("delete ref", request).await?;
        Ok(())
    }

    async fn list_issues(&self) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        let mut page = 1;

        loop {
            let request = self.request(Method::GET, "/issues").query(&[
                ("state", "open".to_string()),
                ("per_page", ISSUES_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ]);
            let response = self.send("list issues", request).await?;
            let batch: Vec<Issue> = Self::json("list issues", response).await?;
            let last_page = batch.len() < ISSUES_PER_PAGE;
            issues.extend(batch);

            if last_page {
                return Ok(issues);
            }
            page += 1;
        }
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<()> {
        let request = self.request(Method::POST, "/issues").json(issue);
        self.send("create issue", request).await?;
        info!("Created issue: {}", issue.title);
        Ok(())
    }
}
