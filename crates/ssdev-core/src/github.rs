//! Minimal blocking client for the two GitHub endpoints the resolvers need:
//! raw file contents and pull request metadata.

use crate::config::Config;
use crate::error::{Result, SsdevError};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub head: PullRequestHead,
    pub base: PullRequestBase,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestHead {
    /// `None` when the fork the PR was opened from has been deleted.
    pub repo: Option<HeadRepository>,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub user: GitHubUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadRepository {
    pub ssh_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestBase {
    #[serde(rename = "ref")]
    pub git_ref: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("ssdev/", env!("CARGO_PKG_VERSION"))),
        );
        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| SsdevError::RemoteFetch {
                target: api_url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(GitHubClient {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.github_api_url, config.github_token.clone())
    }

    /// Fetch the raw bytes of `path` in `org/repo` at `git_ref` (default
    /// branch when `None`).
    pub fn file_contents(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Vec<u8>> {
        let url = format!("{}/repos/{org}/{repo}/contents/{path}", self.api_url);
        let target = match git_ref {
            Some(r) => format!("{org}/{repo}/{path}@{r}"),
            None => format!("{org}/{repo}/{path}"),
        };
        let mut request = self.http.get(&url).header(ACCEPT, RAW_MEDIA_TYPE);
        if let Some(r) = git_ref {
            request = request.query(&[("ref", r)]);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        debug!(%url, ?git_ref, "fetching file contents");
        let response = request.send().map_err(|e| fetch_error(&target, e))?;
        let response = check_status(&target, response)?;
        let bytes = response.bytes().map_err(|e| fetch_error(&target, e))?;
        Ok(bytes.to_vec())
    }

    pub fn pull_request(&self, org: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let url = format!("{}/repos/{org}/{repo}/pulls/{number}", self.api_url);
        let target = format!("{org}/{repo}#{number}");
        let mut request = self.http.get(&url).header(ACCEPT, JSON_MEDIA_TYPE);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        debug!(%url, "fetching pull request");
        let response = request.send().map_err(|e| fetch_error(&target, e))?;
        let response = check_status(&target, response)?;
        let body = response.text().map_err(|e| fetch_error(&target, e))?;
        serde_json::from_str(&body).map_err(|e| SsdevError::ManifestParse {
            target,
            reason: e.to_string(),
        })
    }
}

fn fetch_error(target: &str, err: reqwest::Error) -> SsdevError {
    SsdevError::RemoteFetch {
        target: target.to_string(),
        reason: err.to_string(),
    }
}

fn check_status(target: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let reason = match status.as_u16() {
        404 => "not found (check the repository, branch and token)".to_string(),
        401 | 403 => format!("access denied ({status})"),
        _ => format!("unexpected response ({status})"),
    };
    Err(SsdevError::RemoteFetch {
        target: target.to_string(),
        reason,
    })
}
