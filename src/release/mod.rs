//! Release orchestration.
//!
//! Runs the whole release as one saga:
//!
//! 1. download the selected metadata documents and the release assets
//! 2. create a new draft version on Zenodo and read its DOI
//! 3. rewrite every metadata document, then push them to GitHub
//! 4. clear the files the draft inherited from the previous version
//! 5. download a zip snapshot of the default branch
//! 6. upload assets and snapshot, replace the deposition metadata
//! 7. publish (unless the operator asked for a draft only)
//!
//! Nothing remote changes before step 2; `.zenodo.json` is parsed before then. From step 2 on, any failure deletes
//! the draft before the error is returned.

mod phases;

use crate::context::ReleaseContext;
use crate::deposit::{DepositDraft, DepositService, DraftState};
use crate::error::{ReleaseError, Result};
use crate::github::SourceHost;
use crate::metadata::MetadataDocument;
use crate::workspace::{StagedAsset, Workspace};
use chrono::NaiveDate;

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// Normalized tag written to the metadata documents
    pub tag: String,
    /// DOI of the new version
    pub doi: String,
    /// Zenodo deposition id of the new version
    pub draft_id: String,
    /// `Published`, or `Open` when publishing was skipped
    pub state: DraftState,
}

impl ReleaseOutcome {
    /// Whether the new version was published
    pub fn published(&self) -> bool {
        self.state == DraftState::Published
    }
}

/// Drives one release from event to published deposition
pub struct ReleaseOrchestrator<'a> {
    context: ReleaseContext,
    source: &'a dyn SourceHost,
    deposit: &'a dyn DepositService,
    workspace: Workspace,
    today: Option<NaiveDate>,
}

impl<'a> ReleaseOrchestrator<'a> {
    /// Orchestrator for `context`, staging files in `workspace`
    pub fn new(
        context: ReleaseContext,
        source: &'a dyn SourceHost,
        deposit: &'a dyn DepositService,
        workspace: Workspace,
    ) -> Self {
        Self {
            context,
            source,
            deposit,
            workspace,
            today: None,
        }
    }

    /// Stamp metadata documents with `date` instead of today's date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.today = Some(date);
        self
    }

    /// Release context of this run
    pub fn context(&self) -> &ReleaseContext {
        &self.context
    }

    /// Run the release. An orchestrator runs once: its context holds a single draft.
    pub async fn run(self) -> Result<ReleaseOutcome> {
        let documents = self.download_metadata_documents().await?;
        let mut assets = self.download_release_assets().await?;
        let deposit_metadata = documents
            .iter()
            .find(|d| !d.kind.is_rewritten())
            .map(MetadataDocument::load_deposit_metadata)
            .transpose()?;

        let mut draft =
            DepositDraft::create(self.deposit, self.context.original_deposition_id()).await?;

        let populated = self
            .populate_draft(&mut draft, &documents, &mut assets, deposit_metadata.as_ref())
            .await;
        if let Err(error) = populated {
            return Err(self.compensate(&mut draft, error).await);
        }

        let outcome = ReleaseOutcome {
            tag: self.context.tag_name(),
            doi: draft.doi().to_string(),
            draft_id: draft.id().to_string(),
            state: draft.state(),
        };

        log::info!("Finished!");
        log::info!("Version: {}", outcome.tag);
        log::info!("DOI: {}", outcome.doi);
        Ok(outcome)
    }

    /// Every step that runs while the draft is open
    async fn populate_draft(
        &self,
        draft: &mut DepositDraft,
        documents: &[MetadataDocument],
        assets: &mut Vec<StagedAsset>,
        deposit_metadata: Option<&serde_json::Value>,
    ) -> Result<()> {
        draft.refresh(self.deposit).await?;
        self.context.bind_draft(draft.id(), draft.doi())?;

        if self.context.update_metadata_files() {
            self.rewrite_metadata_documents(documents)?;
            self.push_metadata_documents(documents).await?;
            log::info!("Uploaded metadata files to GitHub");
        }

        let removed = draft.clear_files(self.deposit).await?;
        log::info!("Removed {} inherited file(s) from the draft", removed);

        assets.push(self.download_snapshot().await?);
        log::info!("Downloaded source code zipball from GitHub");

        for asset in assets.iter() {
            log::info!("Preparing {} upload...", asset.name);
            draft.upload(self.deposit, &asset.name, &asset.path).await?;
        }

        if let Some(metadata) = deposit_metadata {
            draft.replace_metadata(self.deposit, metadata).await?;
        }

        if self.context.publish() {
            draft.publish(self.deposit).await?;
        } else {
            log::info!("Leaving deposition {} as a draft", draft.id());
        }
        Ok(())
    }

    /// Delete the draft after `error`. The returned error is `error`, wrapped
    /// when the delete failed too.
    async fn compensate(&self, draft: &mut DepositDraft, error: ReleaseError) -> ReleaseError {
        log::error!("Release failed: {}", error);

        if draft.state() != DraftState::Open {
            return error;
        }

        match draft.delete(self.deposit).await {
            Ok(()) => {
                log::info!("Deleted draft deposition {}", draft.id());
                error
            }
            Err(cleanup) => {
                log::error!(
                    "Could not delete draft Zenodo deposition {}. {}",
                    draft.id(),
                    cleanup
                );
                ReleaseError::Compensation {
                    source: Box::new(error),
                    draft_id: draft.id().to_string(),
                    cleanup: cleanup.to_string(),
                }
            }
        }
    }
}
