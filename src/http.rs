//! HTTP plumbing shared by the GitHub and Zenodo clients.
//!
//! Provides client construction, status checking that keeps the response body
//! for the error message, and streaming of response bodies to disk.

use crate::error::{RemoteError, RemoteService, Result};
use futures_lite::StreamExt as _;
use reqwest::{Response, StatusCode};
use std::path::Path;
use tokio::io::AsyncWriteExt as _;

/// Longest response body kept in an error message
const MAX_ERROR_BODY: usize = 2048;

/// User agent sent with every request (GitHub rejects requests without one)
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the shared reqwest client
pub fn build_client(service: RemoteService) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| {
            RemoteError::Transport {
                service,
                operation: "client setup".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
}

/// Map a reqwest error raised before a response was available
pub fn transport_error(service: RemoteService, operation: &str, error: reqwest::Error) -> RemoteError {
    let reason = if error.is_timeout() {
        format!("timed out: {}", error)
    } else {
        error.to_string()
    };
    RemoteError::Transport {
        service,
        operation: operation.to_string(),
        reason,
    }
}

/// Turn an unexpected response into a status error, keeping (part of) its body
pub async fn status_error(service: RemoteService, operation: &str, response: Response) -> RemoteError {
    let status = response.status().as_u16();
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    RemoteError::Status {
        service,
        operation: operation.to_string(),
        status,
        body,
    }
}

/// Pass the response through when its status is one of `expected`
pub async fn expect_status(
    service: RemoteService,
    operation: &str,
    response: Response,
    expected: &[StatusCode],
) -> Result<Response> {
    if expected.contains(&response.status()) {
        Ok(response)
    } else {
        Err(status_error(service, operation, response).await.into())
    }
}

/// Write the response body to `destination` chunk by chunk
pub async fn stream_to_file(
    service: RemoteService,
    operation: &str,
    response: Response,
    destination: &Path,
) -> Result<u64> {
    let mut file = tokio::fs::File::create(destination).await?;
    let mut stream = std::pin::pin!(response.bytes_stream());
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| transport_error(service, operation, e))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    log::debug!("Wrote {} bytes to {}", written, destination.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_names_crate() {
        assert!(USER_AGENT.starts_with("zenodo_release/"));
    }
}
