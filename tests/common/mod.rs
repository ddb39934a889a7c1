//! In-memory source host and deposit service for workflow tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zenodo_release::context::{CommitterIdentity, ReleaseContext, ReleaseEvent, ReleaseOptions};
use zenodo_release::deposit::{DepositFile, DepositService, DraftSnapshot, FileRemoval};
use zenodo_release::error::{ReleaseError, RemoteError, RemoteService, Result};
use zenodo_release::github::{SourceHost, snapshot_file_name};

pub const REPOSITORY: &str = "owner/name";
pub const PREVIOUS_ID: &str = "123";
pub const DRAFT_ID: &str = "456";
pub const DOI: &str = "10.5281/zenodo.456";
pub const BUCKET: &str = "https://zenodo.test/api/files/bucket-456";

pub const CODEMETA: &str = r#"{
  "@context": "https://doi.org/10.5063/schema/codemeta-2.0",
  "name": "name",
  "version": "1.0.1",
  "identifier": "10.5281/zenodo.123"
}
"#;

pub const CITATION: &str = "cff-version: 1.2.0
title: name
version: 1.0.1
identifiers:
  - type: url
    value: https://example.org
  - type: doi
    value: 10.5281/zenodo.123
";

pub const ZENODO_JSON: &str = r#"{"title": "name", "upload_type": "software"}"#;

/// Ordered record of remote calls across both fakes
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.starts_with(prefix))
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// A committed file write
#[derive(Debug, Clone)]
pub struct PutCall {
    pub path: String,
    pub content: String,
    pub revision: Option<String>,
    pub message: String,
    pub committer: Option<CommitterIdentity>,
}

/// Source host holding the default branch in memory
pub struct FakeSourceHost {
    journal: Journal,
    files: Mutex<HashMap<String, (String, String)>>,
    puts: Mutex<Vec<PutCall>>,
    put_failure: Mutex<Option<u16>>,
}

impl FakeSourceHost {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            files: Mutex::new(HashMap::new()),
            puts: Mutex::new(Vec::new()),
            put_failure: Mutex::new(None),
        }
    }

    /// Repository with all three metadata documents
    pub fn with_documents(journal: Journal) -> Self {
        let host = Self::new(journal);
        host.seed("codemeta.json", CODEMETA);
        host.seed("CITATION.cff", CITATION);
        host.seed(".zenodo.json", ZENODO_JSON);
        host
    }

    pub fn seed(&self, path: &str, content: &str) {
        let sha = format!("sha-{}-0", path);
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), (content.to_string(), sha));
    }

    pub fn fail_puts_with(&self, status: u16) {
        *self.put_failure.lock().unwrap() = Some(status);
    }

    pub fn puts(&self) -> Vec<PutCall> {
        self.puts.lock().unwrap().clone()
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).map(|(c, _)| c.clone())
    }
}

#[async_trait]
impl SourceHost for FakeSourceHost {
    async fn fetch_versioned_file(&self, _repo: &str, path: &str) -> Result<String> {
        self.journal.record(format!("fetch {}", path));
        self.content(path).ok_or_else(|| ReleaseError::NotFound {
            service: RemoteService::GitHub,
            resource: path.to_string(),
        })
    }

    async fn get_file_revision(&self, _repo: &str, path: &str) -> Result<Option<String>> {
        self.journal.record(format!("revision {}", path));
        Ok(self.files.lock().unwrap().get(path).map(|(_, sha)| sha.clone()))
    }

    async fn put_versioned_file(
        &self,
        _repo: &str,
        path: &str,
        content: &[u8],
        revision: Option<&str>,
        message: &str,
        committer: Option<&CommitterIdentity>,
    ) -> Result<()> {
        self.journal.record(format!("put {}", path));

        if let Some(status) = *self.put_failure.lock().unwrap() {
            return Err(RemoteError::Status {
                service: RemoteService::GitHub,
                operation: format!("update {}", path),
                status,
                body: "sha does not match".to_string(),
            }
            .into());
        }

        let content = String::from_utf8(content.to_vec()).expect("utf-8 content");
        self.puts.lock().unwrap().push(PutCall {
            path: path.to_string(),
            content: content.clone(),
            revision: revision.map(String::from),
            message: message.to_string(),
            committer: committer.cloned(),
        });

        let mut files = self.files.lock().unwrap();
        let next = files.len();
        files.insert(path.to_string(), (content, format!("sha-{}-{}", path, next + 1)));
        Ok(())
    }

    async fn download_release_asset(&self, url: &str, destination: &Path) -> Result<()> {
        self.journal.record(format!("asset {}", url));
        std::fs::write(destination, format!("asset from {}", url))?;
        Ok(())
    }

    async fn download_source_snapshot(
        &self,
        repo: &str,
        branch: &str,
        tag: &str,
        dir: &Path,
    ) -> Result<PathBuf> {
        self.journal.record(format!("snapshot {}", branch));
        let path = dir.join(snapshot_file_name(repo, tag));
        std::fs::write(&path, b"PK\x03\x04")?;
        Ok(path)
    }
}

/// Deposit service step that can be made to fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositFailure {
    CreateNewVersion,
    GetDraft,
    RemoveTransport,
    Upload(String),
    ReplaceMetadata,
    Publish,
    Delete,
}

/// Remote state of the draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDraft {
    Absent,
    Open,
    Published,
    Deleted,
}

/// Deposit service keeping a single draft in memory
pub struct FakeDeposit {
    journal: Journal,
    inherited: Vec<DepositFile>,
    skipped_removals: Mutex<Vec<String>>,
    failures: Mutex<Vec<DepositFailure>>,
    draft: Mutex<RemoteDraft>,
    uploads: Mutex<Vec<(String, String)>>,
    removed: Mutex<Vec<String>>,
    metadata: Mutex<Option<serde_json::Value>>,
}

impl FakeDeposit {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            inherited: vec![
                DepositFile {
                    id: "f1".to_string(),
                    filename: "name-1.0.1.zip".to_string(),
                },
                DepositFile {
                    id: "f2".to_string(),
                    filename: "tool-1.0.1.tar.gz".to_string(),
                },
            ],
            skipped_removals: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            draft: Mutex::new(RemoteDraft::Absent),
            uploads: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
            metadata: Mutex::new(None),
        }
    }

    pub fn fail(&self, failure: DepositFailure) {
        self.failures.lock().unwrap().push(failure);
    }

    /// Answer removals of `file_id` with a non-204 status
    pub fn skip_removal(&self, file_id: &str) {
        self.skipped_removals.lock().unwrap().push(file_id.to_string());
    }

    pub fn draft(&self) -> RemoteDraft {
        *self.draft.lock().unwrap()
    }

    pub fn upload_names(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn upload_buckets(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|(_, b)| b.clone()).collect()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    pub fn metadata(&self) -> Option<serde_json::Value> {
        self.metadata.lock().unwrap().clone()
    }

    fn failing(&self, failure: &DepositFailure) -> bool {
        self.failures.lock().unwrap().contains(failure)
    }

    fn status_error(operation: &str, status: u16) -> ReleaseError {
        RemoteError::Status {
            service: RemoteService::Zenodo,
            operation: operation.to_string(),
            status,
            body: "{\"message\": \"injected\"}".to_string(),
        }
        .into()
    }

    fn require_open(&self, draft_id: &str) {
        assert_eq!(draft_id, DRAFT_ID);
        assert_eq!(self.draft(), RemoteDraft::Open, "draft must be open");
    }
}

#[async_trait]
impl DepositService for FakeDeposit {
    async fn create_new_version(&self, previous_id: &str) -> Result<String> {
        self.journal.record(format!("newversion {}", previous_id));
        if self.failing(&DepositFailure::CreateNewVersion) {
            return Err(Self::status_error("create new version", 403));
        }
        *self.draft.lock().unwrap() = RemoteDraft::Open;
        Ok(DRAFT_ID.to_string())
    }

    async fn get_draft(&self, draft_id: &str) -> Result<DraftSnapshot> {
        self.journal.record(format!("get {}", draft_id));
        self.require_open(draft_id);
        if self.failing(&DepositFailure::GetDraft) {
            return Err(Self::status_error("get deposition", 500));
        }
        Ok(DraftSnapshot {
            id: draft_id.to_string(),
            doi: DOI.to_string(),
            bucket_url: BUCKET.to_string(),
            files: self.inherited.clone(),
        })
    }

    async fn remove_file(&self, draft_id: &str, file_id: &str) -> Result<FileRemoval> {
        self.journal.record(format!("remove {}", file_id));
        self.require_open(draft_id);
        if self.failing(&DepositFailure::RemoveTransport) {
            return Err(RemoteError::Transport {
                service: RemoteService::Zenodo,
                operation: "remove file".to_string(),
                reason: "connection reset".to_string(),
            }
            .into());
        }
        if self.skipped_removals.lock().unwrap().iter().any(|id| id == file_id) {
            return Ok(FileRemoval::Skipped { status: 404 });
        }
        self.removed.lock().unwrap().push(file_id.to_string());
        Ok(FileRemoval::Removed)
    }

    async fn upload_file(&self, bucket_url: &str, name: &str, path: &Path) -> Result<()> {
        self.journal.record(format!("upload {}", name));
        self.require_open(DRAFT_ID);
        if self.failing(&DepositFailure::Upload(name.to_string())) {
            return Err(Self::status_error("upload", 500));
        }
        assert!(path.is_file(), "{} staged before upload", name);
        self.uploads
            .lock()
            .unwrap()
            .push((name.to_string(), bucket_url.to_string()));
        Ok(())
    }

    async fn replace_metadata(&self, draft_id: &str, metadata: &serde_json::Value) -> Result<()> {
        self.journal.record(format!("metadata {}", draft_id));
        self.require_open(draft_id);
        if self.failing(&DepositFailure::ReplaceMetadata) {
            return Err(Self::status_error("update metadata", 400));
        }
        *self.metadata.lock().unwrap() = Some(metadata.clone());
        Ok(())
    }

    async fn publish(&self, draft_id: &str) -> Result<()> {
        self.journal.record(format!("publish {}", draft_id));
        self.require_open(draft_id);
        if self.failing(&DepositFailure::Publish) {
            return Err(Self::status_error("publish", 400));
        }
        *self.draft.lock().unwrap() = RemoteDraft::Published;
        Ok(())
    }

    async fn delete(&self, draft_id: &str) -> Result<()> {
        self.journal.record(format!("delete {}", draft_id));
        self.require_open(draft_id);
        if self.failing(&DepositFailure::Delete) {
            return Err(Self::status_error("delete deposition", 500));
        }
        *self.draft.lock().unwrap() = RemoteDraft::Deleted;
        Ok(())
    }
}

/// `release` event for `owner/name` at `tag` with four attachments
pub fn release_event(tag: &str) -> ReleaseEvent {
    ReleaseEvent::from_json(&format!(
        r#"{{
  "repository": {{"full_name": "{}", "default_branch": "main"}},
  "release": {{
    "tag_name": "{}",
    "assets": [
      {{"name": "tool-linux.tar.gz", "browser_download_url": "https://github.test/dl/tool-linux.tar.gz"}},
      {{"name": "tool-macos.zip", "browser_download_url": "https://github.test/dl/tool-macos.zip"}},
      {{"name": "checksums.json", "browser_download_url": "https://github.test/dl/checksums.json"}},
      {{"name": "NOTES.txt", "browser_download_url": "https://github.test/dl/NOTES.txt"}}
    ]
  }}
}}"#,
        REPOSITORY, tag
    ))
    .expect("event parses")
}

/// Options selecting every document and publishing at the end
pub fn all_documents() -> ReleaseOptions {
    let mut options = ReleaseOptions {
        update_metadata_files: true,
        deposition_id: PREVIOUS_ID.to_string(),
        publish: true,
        ..ReleaseOptions::default()
    };
    options.documents.codemeta_json = true;
    options.documents.citation_cff = true;
    options.documents.zenodo_json = true;
    options
}

pub fn context(tag: &str, options: ReleaseOptions) -> ReleaseContext {
    ReleaseContext::build(&release_event(tag), options).expect("context builds")
}
