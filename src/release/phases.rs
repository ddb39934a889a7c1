//! Individual release steps used by the orchestrator.

use super::ReleaseOrchestrator;
use crate::error::{ConfigError, Result};
use crate::github::snapshot_file_name;
use crate::metadata::{MetadataDocument, MetadataRewriter};
use crate::workspace::StagedAsset;

impl ReleaseOrchestrator<'_> {
    /// Fetch every selected metadata document into the staging directory
    pub(super) async fn download_metadata_documents(&self) -> Result<Vec<MetadataDocument>> {
        let mut documents = Vec::new();

        for kind in self.context.documents().kinds() {
            let document = MetadataDocument::in_dir(kind, self.workspace.metadata_dir());
            let content = self
                .source
                .fetch_versioned_file(self.context.repository(), document.remote_path())
                .await?;

            log::info!("Writing {} to {}", kind, document.path.display());
            document.write(&content)?;
            documents.push(document);
        }

        Ok(documents)
    }

    /// Fetch every release attachment into the assets directory
    pub(super) async fn download_release_assets(&self) -> Result<Vec<StagedAsset>> {
        let snapshot = snapshot_file_name(self.context.repository(), &self.context.tag_name());
        if self.context.assets().iter().any(|asset| asset.name == snapshot) {
            return Err(ConfigError::InvalidValue {
                field: "release.assets[].name".to_string(),
                reason: format!("'{}' is the name of the source snapshot", snapshot),
            }
            .into());
        }

        let mut staged = Vec::with_capacity(self.context.assets().len() + 1);

        for asset in self.context.assets() {
            let target = self.workspace.asset_path(&asset.name)?;
            self.source
                .download_release_asset(&asset.browser_download_url, &target.path)
                .await?;
            staged.push(target);
        }

        Ok(staged)
    }

    /// Rewrite every rewritable document. Runs to completion before anything is pushed.
    pub(super) fn rewrite_metadata_documents(&self, documents: &[MetadataDocument]) -> Result<()> {
        let rewriter = match self.today {
            Some(date) => MetadataRewriter::with_date(&self.context, date),
            None => MetadataRewriter::new(&self.context),
        };

        for document in documents {
            rewriter.rewrite(document)?;
        }
        Ok(())
    }

    /// Commit the rewritten documents to the default branch
    pub(super) async fn push_metadata_documents(&self, documents: &[MetadataDocument]) -> Result<()> {
        let committer = self.context.committer_identity();

        for document in documents.iter().filter(|d| d.kind.is_rewritten()) {
            let content = document.read()?;
            let message = self.context.commit_message(document.remote_path());

            self.source
                .update_versioned_file(
                    self.context.repository(),
                    document.remote_path(),
                    content.as_bytes(),
                    &message,
                    committer.as_ref(),
                )
                .await?;
        }
        Ok(())
    }

    /// Zip snapshot of the default branch, taken after the metadata commits
    pub(super) async fn download_snapshot(&self) -> Result<StagedAsset> {
        let path = self
            .source
            .download_source_snapshot(
                self.context.repository(),
                self.context.default_branch(),
                &self.context.tag_name(),
                self.workspace.assets_dir(),
            )
            .await?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .unwrap_or_else(|| {
                snapshot_file_name(self.context.repository(), &self.context.tag_name())
            });

        Ok(StagedAsset { name, path })
    }
}
