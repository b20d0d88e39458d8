//! GitHub REST v3 implementation of the source-control client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::client::ScmClient;
use crate::types::{CheckRun, IssueComment};
use crate::{ScmError, ScmResult};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;

/// GitHub REST client bound to a single repository.
pub struct GitHubClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Create a new client for `owner/repo` authenticated with `token`.
    pub fn new(token: &str, owner: &str, repo: &str) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("prgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        GitHubClient {
            http_client,
            base_url: DEFAULT_API_BASE.to_string(),
            token: token.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

    /// Override the API base URL (test servers, GitHub Enterprise).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_url, self.owner, self.repo, path
        )
    }

    /// Issue a GET and decode the JSON body, mapping non-2xx to `ScmError::Api`.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> ScmResult<T> {
        debug!(url, "GET");
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ScmError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Deserialize)]
struct PullRequestFile {
    filename: String,
}

#[derive(Deserialize)]
struct CheckRunsPage {
    check_runs: Vec<CheckRun>,
}

#[async_trait]
impl ScmClient for GitHubClient {
    async fn list_changed_files(&self, pr_number: u64) -> ScmResult<Vec<String>> {
        let mut files = Vec::new();
        for page in 1.. {
            let url = format!(
                "{}?per_page={}&page={}",
                self.repo_url(&format!("pulls/{}/files", pr_number)),
                PER_PAGE,
                page
            );
            let batch: Vec<PullRequestFile> = self.get_json(&url).await?;
            let batch_len = batch.len();
            files.extend(batch.into_iter().map(|f| f.filename));
            if batch_len < PER_PAGE {
                break;
            }
        }
        Ok(files)
    }

    async fn list_check_runs(&self, head_sha: &str, check_name: &str) -> ScmResult<Vec<CheckRun>> {
        // filter=all returns every rerun for the name, not only the latest;
        // the coordinator picks the authoritative one itself.
        let url = format!(
            "{}?check_name={}&filter=all&per_page={}",
            self.repo_url(&format!("commits/{}/check-runs", head_sha)),
            check_name,
            PER_PAGE
        );
        let page: CheckRunsPage = self.get_json(&url).await?;
        Ok(page.check_runs)
    }

    async fn list_comments(&self, pr_number: u64) -> ScmResult<Vec<IssueComment>> {
        let mut comments = Vec::new();
        for page in 1.. {
            let url = format!(
                "{}?per_page={}&page={}",
                self.repo_url(&format!("issues/{}/comments", pr_number)),
                PER_PAGE,
                page
            );
            let batch: Vec<IssueComment> = self.get_json(&url).await?;
            let batch_len = batch.len();
            comments.extend(batch);
            if batch_len < PER_PAGE {
                break;
            }
        }
        Ok(comments)
    }

    async fn create_comment(&self, pr_number: u64, body: &str) -> ScmResult<()> {
        let url = self.repo_url(&format!("issues/{}/comments", pr_number));
        debug!(url, "POST");
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScmError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
