use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use prbridge_github_issues::github_transport_helpers::{is_not_found_status, truncate_for_error};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::RepoRef;

const GITHUB_ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Clone, Deserialize)]
/// Public struct `GithubCommentCreateResponse` returned by issue-comment creation.
pub struct GithubCommentCreateResponse {
    pub id: u64,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GithubGitRef {
    object: GithubGitObject,
}

#[derive(Debug, Clone, Deserialize)]
struct GithubGitObject {
    sha: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GithubContentFile {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GithubPullRequest {
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Clone)]
/// Thin GitHub REST client. Every call is issued once; failures surface the
/// status and a truncated response body.
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
    repo: RepoRef,
}

impl GithubApiClient {
    pub fn new(
        api_base: &str,
        token: &str,
        repo: RepoRef,
        request_timeout_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("prbridge-issue-comment-bridge"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http: client,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo,
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.repo.owner, self.repo.name, suffix
        )
    }

    fn contents_url(&self, path: &str) -> String {
        self.repo_url(&format!("contents/{}", encode_content_path(path)))
    }

    /// Resolves `refs/heads/<branch>` to the commit sha it points at.
    pub async fn resolve_branch_head_sha(&self, branch: &str) -> Result<String> {
        let git_ref: GithubGitRef = self
            .request_json(
                "resolve branch head",
                self.http
                    .get(self.repo_url(&format!("git/ref/heads/{branch}"))),
            )
            .await?;
        let sha = git_ref.object.sha.trim().to_string();
        if sha.is_empty() {
            bail!("could not resolve branch sha for '{branch}'");
        }
        Ok(sha)
    }

    pub async fn create_branch(&self, branch: &str, from_sha: &str) -> Result<()> {
        let payload = json!({
            "ref": format!("refs/heads/{branch}"),
            "sha": from_sha,
        });
        let _: Value = self
            .request_json(
                "create branch",
                self.http.post(self.repo_url("git/refs")).json(&payload),
            )
            .await?;
        Ok(())
    }

    async fn get_content_file(&self, path: &str, git_ref: &str) -> Result<Option<GithubContentFile>> {
        self.request_optional_json(
            "get file contents",
            self.http
                .get(self.contents_url(path))
                .query(&[("ref", git_ref)]),
        )
        .await
    }

    /// Content hash of `path` at `git_ref`, or `None` when the file does not exist.
    pub async fn get_file_sha(&self, path: &str, git_ref: &str) -> Result<Option<String>> {
        Ok(self
            .get_content_file(path, git_ref)
            .await?
            .map(|file| file.sha))
    }

    /// Decoded UTF-8 text of `path` at `git_ref`, or `None` when absent.
    pub async fn get_file_text(&self, path: &str, git_ref: &str) -> Result<Option<String>> {
        let Some(file) = self.get_content_file(path, git_ref).await? else {
            return Ok(None);
        };
        if let Some(encoding) = file.encoding.as_deref() {
            if encoding != "base64" {
                bail!("unsupported github content encoding '{encoding}' for {path}");
            }
        }
        let encoded = file
            .content
            .unwrap_or_default()
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect::<String>();
        let bytes = BASE64_STANDARD
            .decode(encoded.as_bytes())
            .with_context(|| format!("failed to decode github content for {path}"))?;
        let text = String::from_utf8(bytes)
            .with_context(|| format!("github content for {path} is not valid utf-8"))?;
        Ok(Some(text))
    }

    /// Creates or replaces a file. `existing_sha` must name the content being
    /// replaced, or be `None` for a fresh create.
    pub async fn put_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
        existing_sha: Option<&str>,
    ) -> Result<()> {
        let mut payload = json!({
            "message": message,
            "content": BASE64_STANDARD.encode(content.as_bytes()),
            "branch": branch,
        });
        if let Some(sha) = existing_sha {
            payload["sha"] = Value::String(sha.to_string());
        }
        let _: Value = self
            .request_json(
                "put file",
                self.http.put(self.contents_url(path)).json(&payload),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_file(
        &self,
        path: &str,
        message: &str,
        branch: &str,
        existing_sha: &str,
    ) -> Result<()> {
        let payload = json!({
            "message": message,
            "sha": existing_sha,
            "branch": branch,
        });
        let _: Value = self
            .request_json(
                "delete file",
                self.http.delete(self.contents_url(path)).json(&payload),
            )
            .await?;
        Ok(())
    }

    /// Opens a pull request and returns its html url.
    pub async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<String> {
        let payload = json!({
            "title": title,
            "body": body,
            "head": head,
            "base": base,
        });
        let pull_request: GithubPullRequest = self
            .request_json(
                "create pull request",
                self.http.post(self.repo_url("pulls")).json(&payload),
            )
            .await?;
        pull_request
            .html_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow!("pull request creation response is missing html_url"))
    }

    pub async fn create_issue_comment(
        &self,
        issue_number: u64,
        body: &str,
    ) -> Result<GithubCommentCreateResponse> {
        let payload = json!({ "body": body });
        self.request_json(
            "create issue comment",
            self.http
                .post(self.repo_url(&format!("issues/{issue_number}/comments")))
                .json(&payload),
        )
        .await
    }

    async fn request_json<T>(&self, operation: &str, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        match self.request_optional_json(operation, request).await? {
            Some(parsed) => Ok(parsed),
            None => bail!("github api {operation} failed with status 404: not found"),
        }
    }

    async fn request_optional_json<T>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .with_context(|| format!("github api {operation} request failed"))?;
        let status = response.status();
        tracing::info!(operation, status = status.as_u16(), "github api call");
        if is_not_found_status(status.as_u16()) {
            return Ok(None);
        }
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read github {operation} body"))?;
        if !status.is_success() {
            tracing::warn!(
                operation,
                status = status.as_u16(),
                body = %truncate_for_error(&body, GITHUB_ERROR_BODY_MAX_CHARS),
                "github api call failed"
            );
            bail!(
                "github api {operation} failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, GITHUB_ERROR_BODY_MAX_CHARS)
            );
        }
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        let parsed = serde_json::from_str::<T>(body)
            .with_context(|| format!("failed to decode github {operation}"))?;
        Ok(Some(parsed))
    }
}

fn encode_content_path(path: &str) -> String {
    path.split('/')
        .map(percent_encode_path_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn percent_encode_path_segment(value: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut encoded = String::with_capacity(value.len());
    for byte in value.as_bytes() {
        let is_unreserved = matches!(
            byte,
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~'
        );
        if is_unreserved {
            encoded.push(*byte as char);
        } else {
            encoded.push('%');
            encoded.push(HEX[(byte >> 4) as usize] as char);
            encoded.push(HEX[(byte & 0x0F) as usize] as char);
        }
    }
    encoded
}
