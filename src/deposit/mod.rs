//! Deposit service integration: the Zenodo draft lifecycle.
//!
//! A run creates exactly one draft deposition (a new version of an existing
//! record) and drives it through
//!
//! ```text
//! NoDraft ──create_new_version──▶ Open ──publish──▶ Published
//!                                  │
//!                                  └──delete──▶ Deleted
//! ```
//!
//! [`DepositService`] is the raw remote API; [`DepositDraft`] is the handle
//! that tracks the state and refuses operations on a draft that is no longer
//! open.

mod content_type;
mod zenodo;

pub use content_type::upload_content_type;
pub use zenodo::ZenodoClient;

use crate::error::{ReleaseError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Lifecycle state of the run's draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftState {
    /// No draft has been created yet
    NoDraft,
    /// Draft exists and may be modified
    Open,
    /// Draft was published (terminal)
    Published,
    /// Draft was deleted by compensation (terminal)
    Deleted,
}

impl DraftState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, DraftState::Published | DraftState::Deleted)
    }
}

impl fmt::Display for DraftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DraftState::NoDraft => "not created",
            DraftState::Open => "open",
            DraftState::Published => "published",
            DraftState::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// File attached to a deposition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DepositFile {
    /// File id used by the delete endpoint
    pub id: String,
    /// File name
    pub filename: String,
}

/// Current view of a draft as returned by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSnapshot {
    /// Deposition id
    pub id: String,
    /// DOI reserved for the draft
    pub doi: String,
    /// Upload bucket URL
    pub bucket_url: String,
    /// Files currently attached (inherited from the previous version on a new draft)
    pub files: Vec<DepositFile>,
}

/// Outcome of removing a single file from a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRemoval {
    /// Service confirmed the removal
    Removed,
    /// Service answered with another status; the file may already be gone
    Skipped {
        /// HTTP status returned
        status: u16,
    },
}

/// Operations of the deposit service used by the release workflow
#[async_trait]
pub trait DepositService: Send + Sync {
    /// Create a new version of `previous_id`, returning the draft id
    async fn create_new_version(&self, previous_id: &str) -> Result<String>;

    /// Read the draft's files, bucket URL and DOI
    async fn get_draft(&self, draft_id: &str) -> Result<DraftSnapshot>;

    /// Remove one attached file. Only transport failures are errors.
    async fn remove_file(&self, draft_id: &str, file_id: &str) -> Result<FileRemoval>;

    /// Stream a local file to `{bucket_url}/{name}`
    async fn upload_file(&self, bucket_url: &str, name: &str, path: &Path) -> Result<()>;

    /// Replace the descriptive metadata of the draft
    async fn replace_metadata(&self, draft_id: &str, metadata: &serde_json::Value) -> Result<()>;

    /// Publish the draft
    async fn publish(&self, draft_id: &str) -> Result<()>;

    /// Delete the draft
    async fn delete(&self, draft_id: &str) -> Result<()>;
}

/// The run's draft deposition
#[derive(Debug, Clone)]
pub struct DepositDraft {
    id: String,
    doi: String,
    bucket_url: String,
    files: Vec<DepositFile>,
    state: DraftState,
}

impl DepositDraft {
    /// Create a new version of `previous_id`.
    ///
    /// The returned draft is open but not loaded yet; call [`refresh`](Self::refresh)
    /// to read its DOI, bucket and inherited files.
    pub async fn create(service: &dyn DepositService, previous_id: &str) -> Result<Self> {
        let draft_id = service.create_new_version(previous_id).await?;
        log::info!("Created new Zenodo deposition {}", draft_id);

        Ok(Self {
            id: draft_id,
            doi: String::new(),
            bucket_url: String::new(),
            files: Vec::new(),
            state: DraftState::Open,
        })
    }

    /// Deposition id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// DOI reserved for the draft
    pub fn doi(&self) -> &str {
        &self.doi
    }

    /// Upload bucket URL
    pub fn bucket_url(&self) -> &str {
        &self.bucket_url
    }

    /// Files attached as of the last refresh / local bookkeeping
    pub fn files(&self) -> &[DepositFile] {
        &self.files
    }

    /// Lifecycle state
    pub fn state(&self) -> DraftState {
        self.state
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.state == DraftState::Open {
            Ok(())
        } else {
            Err(ReleaseError::InvalidDraftState {
                draft_id: self.id.clone(),
                state: self.state,
                operation,
            })
        }
    }

    /// Re-read files, bucket and DOI from the service
    pub async fn refresh(&mut self, service: &dyn DepositService) -> Result<()> {
        self.ensure_open("refresh")?;
        let snapshot = service.get_draft(&self.id).await?;
        log::info!("Got Zenodo deposition {}", self.id);

        self.doi = snapshot.doi;
        self.bucket_url = snapshot.bucket_url;
        self.files = snapshot.files;
        Ok(())
    }

    /// Remove every file inherited from the previous version.
    ///
    /// Removals the service does not confirm are logged and skipped; a transport
    /// failure aborts the step. Returns the number of confirmed removals.
    pub async fn clear_files(&mut self, service: &dyn DepositService) -> Result<usize> {
        self.ensure_open("remove files from")?;

        let mut removed = 0;
        for file in std::mem::take(&mut self.files) {
            log::info!("Removing file {} from Zenodo draft deposition", file.filename);
            match service.remove_file(&self.id, &file.id).await? {
                FileRemoval::Removed => removed += 1,
                FileRemoval::Skipped { status } => log::warn!(
                    "Could not delete file {} from Zenodo deposition (status {}), continuing",
                    file.filename,
                    status
                ),
            }
        }
        Ok(removed)
    }

    /// Upload a local file under `name`
    pub async fn upload(&mut self, service: &dyn DepositService, name: &str, path: &Path) -> Result<()> {
        self.ensure_open("upload to")?;
        service.upload_file(&self.bucket_url, name, path).await?;
        self.files.push(DepositFile {
            id: String::new(),
            filename: name.to_string(),
        });
        Ok(())
    }

    /// Replace the draft's descriptive metadata
    pub async fn replace_metadata(
        &self,
        service: &dyn DepositService,
        metadata: &serde_json::Value,
    ) -> Result<()> {
        self.ensure_open("update metadata of")?;
        service.replace_metadata(&self.id, metadata).await
    }

    /// Publish the draft (terminal)
    pub async fn publish(&mut self, service: &dyn DepositService) -> Result<()> {
        self.ensure_open("publish")?;
        service.publish(&self.id).await?;
        self.state = DraftState::Published;
        log::info!("Published Zenodo deposition {}", self.id);
        Ok(())
    }

    /// Delete the draft (terminal, compensation only)
    pub async fn delete(&mut self, service: &dyn DepositService) -> Result<()> {
        self.ensure_open("delete")?;
        log::info!("Deleting Zenodo deposition {}", self.id);
        service.delete(&self.id).await?;
        self.state = DraftState::Deleted;
        Ok(())
    }
}
