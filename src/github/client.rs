//! GitHub REST API client for the source-host operations

use super::{SourceHost, snapshot_file_name};
use crate::context::CommitterIdentity;
use crate::error::{ReleaseError, RemoteError, RemoteService, Result};
use crate::http::{build_client, expect_status, status_error, stream_to_file, transport_error};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public GitHub API
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Upper bound for the zipball download
pub const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(150);

const SERVICE: RemoteService = RemoteService::GitHub;

/// Response of `GET /repos/{repo}/contents/{path}` for a file
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: Option<String>,
    content: Option<String>,
    encoding: Option<String>,
}

/// Body of `PUT /repos/{repo}/contents/{path}`
#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<CommitterPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct CommitterPayload<'a> {
    name: &'a str,
    email: &'a str,
}

/// GitHub client authenticated with a token
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    /// Client for api.github.com
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_api_url(token, DEFAULT_API_URL)
    }

    /// Client for a GitHub Enterprise (or test) API root
    pub fn with_api_url(token: impl Into<String>, api_url: &str) -> Result<Self> {
        url::Url::parse(api_url).map_err(|e| {
            crate::error::ConfigError::InvalidValue {
                field: "github_api_url".to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            http: build_client(SERVICE)?,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn contents_url(&self, repo: &str, path: &str) -> String {
        format!("{}/repos/{}/contents/{}", self.api_url, repo, path)
    }

    fn zipball_url(&self, repo: &str, branch: &str) -> String {
        format!("{}/repos/{}/zipball/{}", self.api_url, repo, branch)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
            .bearer_auth(&self.token)
    }

    async fn get_contents(&self, repo: &str, path: &str, operation: &str) -> Result<Option<ContentsResponse>> {
        let url = self.contents_url(repo, path);
        log::debug!("GET {}", url);

        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, operation, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = expect_status(SERVICE, operation, response, &[StatusCode::OK]).await?;
        let contents = response.json::<ContentsResponse>().await.map_err(|e| {
            RemoteError::InvalidResponse {
                service: SERVICE,
                operation: operation.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Some(contents))
    }
}

/// Decode the base64 `content` of a contents response
fn decode_content(path: &str, contents: &ContentsResponse) -> Result<String> {
    let invalid = |reason: String| -> ReleaseError {
        RemoteError::InvalidResponse {
            service: SERVICE,
            operation: format!("fetch {}", path),
            reason,
        }
        .into()
    };

    if let Some(encoding) = contents.encoding.as_deref()
        && encoding != "base64"
    {
        return Err(invalid(format!("unsupported content encoding '{}'", encoding)));
    }

    let encoded: String = contents
        .content
        .as_deref()
        .ok_or_else(|| invalid("response has no content".to_string()))?
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| invalid(format!("invalid base64 content: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| invalid(format!("content is not UTF-8: {}", e)))
}

#[async_trait]
impl SourceHost for GitHubClient {
    async fn fetch_versioned_file(&self, repo: &str, path: &str) -> Result<String> {
        log::info!("Downloading {} from {}", path, self.contents_url(repo, path));

        let contents = self
            .get_contents(repo, path, &format!("fetch {}", path))
            .await?
            .ok_or_else(|| ReleaseError::NotFound {
                service: SERVICE,
                resource: format!("{}/{}", repo, path),
            })?;

        decode_content(path, &contents)
    }

    async fn get_file_revision(&self, repo: &str, path: &str) -> Result<Option<String>> {
        let contents = self
            .get_contents(repo, path, &format!("read revision of {}", path))
            .await?;
        Ok(contents.and_then(|c| c.sha).filter(|sha| !sha.is_empty()))
    }

    async fn put_versioned_file(
        &self,
        repo: &str,
        path: &str,
        content: &[u8],
        revision: Option<&str>,
        message: &str,
        committer: Option<&CommitterIdentity>,
    ) -> Result<()> {
        let operation = format!("upload {}", path);
        let body = PutContentsRequest {
            message,
            content: BASE64.encode(content),
            sha: revision,
            committer: committer.map(|c| CommitterPayload {
                name: &c.name,
                email: &c.email,
            }),
        };

        let response = self
            .request(Method::PUT, &self.contents_url(repo, path))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &operation, e))?;

        expect_status(
            SERVICE,
            &operation,
            response,
            &[StatusCode::OK, StatusCode::CREATED],
        )
        .await?;

        log::info!("Uploaded {} to {}", path, repo);
        Ok(())
    }

    async fn download_release_asset(&self, url: &str, destination: &Path) -> Result<()> {
        let operation = "download release asset";
        log::info!("Downloading {} to {}", url, destination.display());

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, operation, e))?;

        let response = expect_status(SERVICE, operation, response, &[StatusCode::OK]).await?;
        stream_to_file(SERVICE, operation, response, destination).await?;
        Ok(())
    }

    async fn download_source_snapshot(
        &self,
        repo: &str,
        branch: &str,
        tag: &str,
        dir: &Path,
    ) -> Result<PathBuf> {
        let operation = "download source snapshot";
        let file_name = snapshot_file_name(repo, tag);
        let destination = dir.join(&file_name);
        log::info!("Downloading {} to {}", file_name, destination.display());

        let response = self
            .request(Method::GET, &self.zipball_url(repo, branch))
            .timeout(SNAPSHOT_TIMEOUT)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, operation, e))?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, operation, response).await.into());
        }

        stream_to_file(SERVICE, operation, response, &destination).await?;
        log::info!("Downloaded and wrote source code to {}", destination.display());
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client =
            GitHubClient::with_api_url("token", "https://ghe.example.com/api/v3/").expect("client");
        assert_eq!(
            client.contents_url("owner/name", "CITATION.cff"),
            "https://ghe.example.com/api/v3/repos/owner/name/contents/CITATION.cff"
        );
        assert_eq!(
            client.zipball_url("owner/name", "main"),
            "https://ghe.example.com/api/v3/repos/owner/name/zipball/main"
        );
    }

    #[test]
    fn test_rejects_invalid_api_url() {
        assert!(GitHubClient::with_api_url("token", "not a url").is_err());
    }

    #[test]
    fn test_decode_content_with_line_breaks() {
        let encoded = BASE64.encode("cff-version: 1.2.0\ntitle: tool\n");
        let wrapped = format!("{}\n{}", &encoded[..10], &encoded[10..]);
        let contents = ContentsResponse {
            sha: Some("abc".to_string()),
            content: Some(wrapped),
            encoding: Some("base64".to_string()),
        };
        assert_eq!(
            decode_content("CITATION.cff", &contents).expect("decodes"),
            "cff-version: 1.2.0\ntitle: tool\n"
        );
    }

    #[test]
    fn test_decode_rejects_missing_content() {
        let contents = ContentsResponse {
            sha: None,
            content: None,
            encoding: None,
        };
        assert!(decode_content("codemeta.json", &contents).is_err());
    }

    #[test]
    fn test_put_body_omits_absent_fields() {
        let body = PutContentsRequest {
            message: "chore: update codemeta.json",
            content: BASE64.encode("{}"),
            sha: None,
            committer: None,
        };
        let json = serde_json::to_value(&body).expect("serializes");
        assert!(json.get("sha").is_none());
        assert!(json.get("committer").is_none());
        assert_eq!(json["content"], "e30=");
    }

    #[test]
    fn test_put_body_with_revision_and_committer() {
        let body = PutContentsRequest {
            message: "m",
            content: String::new(),
            sha: Some("abc123"),
            committer: Some(CommitterPayload {
                name: "Release Bot",
                email: "bot@example.com",
            }),
        };
        let json = serde_json::to_value(&body).expect("serializes");
        assert_eq!(json["sha"], "abc123");
        assert_eq!(json["committer"]["name"], "Release Bot");
    }
}
