//! GitHub REST v3 client.
//!
//! Commits are built from the low-level git data API (blob -> tree -> commit
//! -> ref update) so a test file can be added to a branch without a clone.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use testsmith_models::{CommitInfo, FileChange, FileStatus, PullRequest};
use tracing::{debug, trace};
use url::Url;

use crate::error::{RemoteError, Result};
use crate::host::RemoteHost;

const GITHUB_API: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("testsmith/", env!("CARGO_PKG_VERSION"));

/// Owner and name of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryId {
    pub owner: String,
    pub name: String,
}

impl RepositoryId {
    /// Parses `https://github.com/owner/repo(.git)`.
    pub fn from_url(repository_url: &str) -> Result<Self> {
        let url = Url::parse(repository_url.trim())
            .map_err(|e| RemoteError::InvalidRepository(format!("{}: {}", repository_url, e)))?;
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [owner, name, ..] => Ok(Self {
                owner: owner.to_string(),
                name: name.trim_end_matches(".git").to_string(),
            }),
            _ => Err(RemoteError::InvalidRepository(format!(
                "{}: expected /owner/repo",
                repository_url
            ))),
        }
    }

    /// API base for the repository's host.
    ///
    /// `github.com` maps to `api.github.com`; other hosts are treated as
    /// GitHub Enterprise (`/api/v3`).
    fn api_base_for(repository_url: &str) -> Result<Url> {
        let url = Url::parse(repository_url.trim())
            .map_err(|e| RemoteError::InvalidRepository(e.to_string()))?;
        let base = match url.host_str() {
            Some("github.com") | Some("www.github.com") => GITHUB_API.to_string(),
            Some(host) => format!("{}://{}/api/v3", url.scheme(), host),
            None => return Err(RemoteError::InvalidRepository(format!("{}: no host", repository_url))),
        };
        Url::parse(&base).map_err(|e| RemoteError::InvalidRepository(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ShaRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    #[serde(default)]
    parents: Vec<ShaRef>,
    #[serde(default)]
    files: Vec<CommitFile>,
}

#[derive(Debug, Deserialize)]
struct CommitFile {
    filename: String,
    #[serde(default)]
    status: FileStatus,
    #[serde(default)]
    additions: u32,
    #[serde(default)]
    deletions: u32,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: ShaRef,
}

#[derive(Debug, Deserialize)]
struct GitCommitResponse {
    tree: ShaRef,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// GitHub implementation of [`RemoteHost`].
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_base: Url,
    repo: RepositoryId,
    token: String,
}

impl GitHubClient {
    /// Creates a client for the repository at `repository_url`.
    pub fn new(repository_url: &str, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_base: RepositoryId::api_base_for(repository_url)?,
            repo: RepositoryId::from_url(repository_url)?,
            token: token.into(),
        })
    }

    /// Overrides the API base URL.
    pub fn with_api_base(mut self, api_base: &str) -> Result<Self> {
        self.api_base =
            Url::parse(api_base).map_err(|e| RemoteError::InvalidRepository(e.to_string()))?;
        Ok(self)
    }

    pub fn repository(&self) -> &RepositoryId {
        &self.repo
    }

    /// `{api_base}/repos/{owner}/{name}/{segments...}`; each segment may contain `/`.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidRepository(format!("{} cannot be a base", self.api_base)))?
            .pop_if_empty()
            .push("repos")
            .push(&self.repo.owner)
            .push(&self.repo.name)
            .extend(segments.iter().flat_map(|s| s.split('/')).filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        trace!(status = status.as_u16(), what, "GitHub response");

        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str], what: &str) -> Result<T> {
        let url = self.endpoint(segments)?;
        self.send(self.request(Method::GET, url), what).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: serde_json::Value,
        what: &str,
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        self.send(self.request(Method::POST, url).json(&body), what).await
    }

    async fn branch_head(&self, branch: &str) -> Result<String> {
        let reference: RefResponse = self
            .get(&["git/ref/heads", branch], &format!("branch {}", branch))
            .await?;
        Ok(reference.object.sha)
    }
}

#[async_trait]
impl RemoteHost for GitHubClient {
    async fn latest_commit(&self, branch: &str) -> Result<CommitInfo> {
        let commit: CommitResponse = self
            .get(&["commits", branch], &format!("branch {}", branch))
            .await?;
        Ok(CommitInfo::new(
            commit.sha,
            commit.parents.into_iter().map(|p| p.sha).collect(),
        ))
    }

    async fn commit_file_diff(&self, sha: &str) -> Result<Vec<FileChange>> {
        let commit: CommitResponse = self.get(&["commits", sha], &format!("commit {}", sha)).await?;
        debug!(sha, files = commit.files.len(), "Fetched commit diff");
        Ok(commit
            .files
            .into_iter()
            .map(|f| FileChange {
                path: f.filename,
                status: f.status,
                additions: f.additions,
                deletions: f.deletions,
            })
            .collect())
    }

    async fn file_content_at(&self, path: &str, sha: &str) -> Result<String> {
        let mut url = self.endpoint(&["contents", path])?;
        url.query_pairs_mut().append_pair("ref", sha);
        let content: ContentResponse = self
            .send(self.request(Method::GET, url), &format!("{} at {}", path, sha))
            .await?;
        if content.encoding != "base64" && !content.encoding.is_empty() {
            return Err(RemoteError::Decode(format!(
                "{}: unsupported encoding '{}'",
                path, content.encoding
            )));
        }
        decode_content(&content.content)
    }

    async fn create_branch(&self, name: &str, from_branch: &str) -> Result<()> {
        let head = self.branch_head(from_branch).await?;
        let _: serde_json::Value = self
            .post(
                &["git/refs"],
                json!({ "ref": format!("refs/heads/{}", name), "sha": head }),
                &format!("create branch {}", name),
            )
            .await?;
        debug!(branch = name, from = from_branch, "Created branch");
        Ok(())
    }

    async fn commit_file(
        &self,
        branch: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<String> {
        let head = self.branch_head(branch).await?;
        let parent: GitCommitResponse = self
            .get(&["git/commits", head.as_str()], &format!("commit {}", head))
            .await?;

        let blob: ShaRef = self
            .post(
                &["git/blobs"],
                json!({ "content": content, "encoding": "utf-8" }),
                "create blob",
            )
            .await?;
        let tree: ShaRef = self
            .post(
                &["git/trees"],
                json!({
                    "base_tree": parent.tree.sha,
                    "tree": [{ "path": path, "mode": "100644", "type": "blob", "sha": blob.sha }],
                }),
                "create tree",
            )
            .await?;
        let commit: ShaRef = self
            .post(
                &["git/commits"],
                json!({ "message": message, "tree": tree.sha, "parents": [head] }),
                "create commit",
            )
            .await?;

        let url = self.endpoint(&["git/refs/heads", branch])?;
        let _: serde_json::Value = self
            .send(
                self.request(Method::PATCH, url)
                    .json(&json!({ "sha": commit.sha, "force": false })),
                &format!("update branch {}", branch),
            )
            .await?;

        debug!(branch, path, sha = %commit.sha, "Committed file");
        Ok(commit.sha)
    }

    async fn create_pull_request(
        &self,
        title: &str,
        head: &str,
        base: &str,
        body: &str,
    ) -> Result<PullRequest> {
        self.post(
            &["pulls"],
            json!({ "title": title, "head": head, "base": base, "body": body }),
            "create pull request",
        )
        .await
    }
}

/// Decodes GitHub's line-wrapped base64 content.
fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| RemoteError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RemoteError::Decode(e.to_string()))
}
