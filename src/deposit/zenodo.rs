//! Zenodo REST API client for the deposition draft lifecycle

use super::{DepositFile, DepositService, DraftSnapshot, FileRemoval, upload_content_type};
use crate::error::{RemoteError, RemoteService, Result};
use crate::http::{build_client, expect_status, transport_error};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::path::Path;
use tokio_util::io::ReaderStream;

const SERVICE: RemoteService = RemoteService::Zenodo;

/// Prefix of `doi_url` values
const DOI_RESOLVER: &str = "https://doi.org/";

#[derive(Debug, Deserialize)]
struct NewVersionResponse {
    links: NewVersionLinks,
}

#[derive(Debug, Deserialize)]
struct NewVersionLinks {
    latest_draft: String,
}

#[derive(Debug, Deserialize)]
struct DepositionResponse {
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    doi_url: Option<String>,
    #[serde(default)]
    metadata: Option<DepositionMetadata>,
    links: DepositionLinks,
    #[serde(default)]
    files: Vec<FileResponse>,
}

#[derive(Debug, Deserialize)]
struct DepositionMetadata {
    #[serde(default)]
    prereserve_doi: Option<PrereservedDoi>,
}

#[derive(Debug, Deserialize)]
struct PrereservedDoi {
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DepositionLinks {
    bucket: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    id: serde_json::Value,
    filename: String,
}

impl DepositionResponse {
    /// DOI of the deposition.
    ///
    /// Unpublished drafts often have an empty `doi`; the reserved DOI is then
    /// found under `metadata.prereserve_doi`, and `doi_url` as a last resort.
    fn resolved_doi(&self) -> Option<String> {
        let non_empty = |s: &Option<String>| s.as_deref().filter(|v| !v.is_empty()).map(String::from);

        non_empty(&self.doi)
            .or_else(|| {
                self.metadata
                    .as_ref()
                    .and_then(|m| m.prereserve_doi.as_ref())
                    .and_then(|p| non_empty(&p.doi))
            })
            .or_else(|| {
                non_empty(&self.doi_url)
                    .map(|url| url.trim_start_matches(DOI_RESOLVER).to_string())
            })
    }
}

/// Last path segment of a deposition URL
/// Bucket URL with `name` appended as one percent-encoded path segment
fn bucket_file_url(bucket_url: &str, name: &str) -> std::result::Result<url::Url, String> {
    let mut url = url::Url::parse(bucket_url)
        .map_err(|e| format!("invalid bucket link '{}': {}", bucket_url, e))?;
    url.path_segments_mut()
        .map_err(|()| format!("bucket link '{}' cannot take a file name", bucket_url))?
        .pop_if_empty()
        .push(name);
    Ok(url)
}

fn draft_id_from_url(url: &str) -> Option<&str> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
}

/// Zenodo client authenticated with a personal access token
pub struct ZenodoClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ZenodoClient {
    /// Client for `base_url` (`https://zenodo.org` or the sandbox)
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        url::Url::parse(base_url).map_err(|e| crate::error::ConfigError::InvalidValue {
            field: "zenodo_url".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            http: build_client(SERVICE)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn deposition_url(&self, draft_id: &str) -> String {
        format!("{}/api/deposit/depositions/{}", self.base_url, draft_id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(&self.token)
    }

    async fn send(&self, operation: &str, request: RequestBuilder, expected: &[StatusCode]) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, operation, e))?;
        expect_status(SERVICE, operation, response, expected).await
    }

    fn invalid_response(operation: &str, reason: impl Into<String>) -> RemoteError {
        RemoteError::InvalidResponse {
            service: SERVICE,
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl DepositService for ZenodoClient {
    async fn create_new_version(&self, previous_id: &str) -> Result<String> {
        let operation = "create new version";
        let url = format!("{}/actions/newversion", self.deposition_url(previous_id));
        log::info!("POST {}", url);

        let response = self
            .send(operation, self.request(Method::POST, &url), &[StatusCode::CREATED])
            .await?;
        let body: NewVersionResponse = response
            .json()
            .await
            .map_err(|e| Self::invalid_response(operation, e.to_string()))?;

        let draft_id = draft_id_from_url(&body.links.latest_draft).ok_or_else(|| {
            Self::invalid_response(
                operation,
                format!("latest_draft '{}' has no deposition id", body.links.latest_draft),
            )
        })?;
        Ok(draft_id.to_string())
    }

    async fn get_draft(&self, draft_id: &str) -> Result<DraftSnapshot> {
        let operation = "get deposition";
        let response = self
            .send(
                operation,
                self.request(Method::GET, &self.deposition_url(draft_id)),
                &[StatusCode::OK],
            )
            .await?;
        let body: DepositionResponse = response
            .json()
            .await
            .map_err(|e| Self::invalid_response(operation, e.to_string()))?;

        let doi = body
            .resolved_doi()
            .ok_or_else(|| Self::invalid_response(operation, "deposition has no DOI"))?;
        let bucket_url = body
            .links
            .bucket
            .clone()
            .ok_or_else(|| Self::invalid_response(operation, "deposition has no bucket link"))?;

        let files = body
            .files
            .into_iter()
            .map(|file| DepositFile {
                id: match file.id {
                    serde_json::Value::String(id) => id,
                    other => other.to_string(),
                },
                filename: file.filename,
            })
            .collect();

        Ok(DraftSnapshot {
            id: draft_id.to_string(),
            doi,
            bucket_url,
            files,
        })
    }

    async fn remove_file(&self, draft_id: &str, file_id: &str) -> Result<FileRemoval> {
        let url = format!("{}/files/{}", self.deposition_url(draft_id), file_id);
        let response = self
            .request(Method::DELETE, &url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, "remove file", e))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            Ok(FileRemoval::Removed)
        } else {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Could not delete file from Zenodo deposition. {} {}", status, body);
            Ok(FileRemoval::Skipped {
                status: status.as_u16(),
            })
        }
    }

    async fn upload_file(&self, bucket_url: &str, name: &str, path: &Path) -> Result<()> {
        let operation = format!("upload {}", name);
        let url = bucket_file_url(bucket_url, name)
            .map_err(|reason| Self::invalid_response(&operation, reason))?;
        let content_type = upload_content_type(name);

        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        log::info!(
            "Uploading file {} to {} ({} bytes, {})",
            name,
            url,
            length,
            content_type
        );

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let request = self
            .request(Method::PUT, url.as_str())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CONTENT_LENGTH, length)
            .body(body);

        self.send(&operation, request, &[StatusCode::OK, StatusCode::CREATED])
            .await?;
        log::info!("Uploaded file {} to Zenodo", name);
        Ok(())
    }

    async fn replace_metadata(&self, draft_id: &str, metadata: &serde_json::Value) -> Result<()> {
        log::info!("Updating Zenodo metadata");
        let request = self
            .request(Method::PUT, &self.deposition_url(draft_id))
            .json(&serde_json::json!({ "metadata": metadata }));

        self.send("update metadata", request, &[StatusCode::OK])
            .await?;
        log::info!("Updated Zenodo metadata");
        Ok(())
    }

    async fn publish(&self, draft_id: &str) -> Result<()> {
        let url = format!("{}/actions/publish", self.deposition_url(draft_id));
        self.send(
            "publish",
            self.request(Method::POST, &url),
            &[StatusCode::OK, StatusCode::ACCEPTED],
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, draft_id: &str) -> Result<()> {
        self.send(
            "delete deposition",
            self.request(Method::DELETE, &self.deposition_url(draft_id)),
            &[StatusCode::CREATED, StatusCode::ACCEPTED, StatusCode::NO_CONTENT],
        )
        .await?;
        Ok(())
    }
}
