//! Source-host integration: versioned files, release assets and source snapshots.

mod client;

pub use client::{DEFAULT_API_URL, GitHubClient, SNAPSHOT_TIMEOUT};

use crate::context::CommitterIdentity;
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Operations the release workflow needs from the source host
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Content of a file on the default branch. Fails with `NotFound` if absent.
    async fn fetch_versioned_file(&self, repo: &str, path: &str) -> Result<String>;

    /// Current revision (blob SHA) of a file, `None` when the file does not exist yet
    async fn get_file_revision(&self, repo: &str, path: &str) -> Result<Option<String>>;

    /// Create (`revision == None`) or overwrite a file with a single commit
    async fn put_versioned_file(
        &self,
        repo: &str,
        path: &str,
        content: &[u8],
        revision: Option<&str>,
        message: &str,
        committer: Option<&CommitterIdentity>,
    ) -> Result<()>;

    /// Download a release attachment to `destination`
    async fn download_release_asset(&self, url: &str, destination: &Path) -> Result<()>;

    /// Download a zip snapshot of `branch` into `dir` as `{name}-{tag}.zip`
    async fn download_source_snapshot(
        &self,
        repo: &str,
        branch: &str,
        tag: &str,
        dir: &Path,
    ) -> Result<PathBuf>;

    /// Create-or-update a file. The revision is read right before the write so
    /// the update carries the latest SHA.
    async fn update_versioned_file(
        &self,
        repo: &str,
        path: &str,
        content: &[u8],
        message: &str,
        committer: Option<&CommitterIdentity>,
    ) -> Result<()> {
        log::info!("Getting the file SHA for {}", path);
        let revision = self.get_file_revision(repo, path).await?;
        log::info!(
            "File SHA for {} is {}",
            path,
            revision.as_deref().unwrap_or("<none>")
        );

        self.put_versioned_file(repo, path, content, revision.as_deref(), message, committer)
            .await
    }
}

/// File name of the source snapshot for a repository and tag
pub fn snapshot_file_name(repo: &str, tag: &str) -> String {
    let name = repo.rsplit('/').next().unwrap_or(repo);
    format!("{}-{}.zip", name, tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_file_name() {
        assert_eq!(snapshot_file_name("owner/name", "1.0.2"), "name-1.0.2.zip");
    }
}
