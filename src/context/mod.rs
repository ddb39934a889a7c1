//! Release context: everything the workflow needs to know about one release.
//!
//! The context is built once from the release event and the operator options
//! and then passed by reference to every component. Two fields are only known
//! after the draft deposition exists (its id and DOI); they are write-once.

mod event;

pub use event::{EventRelease, EventRepository, ReleaseAsset, ReleaseEvent};

use crate::error::{ConfigError, ReleaseError, Result};
use crate::metadata::MetadataKind;
use crate::version::NormalizedTag;
use std::sync::OnceLock;

/// Commit message used when the operator does not supply one
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore: update ${file_name} for Zenodo release";

/// Placeholder replaced by the metadata file name in commit messages
pub const FILE_NAME_PLACEHOLDER: &str = "${file_name}";

/// Zenodo instance receiving the deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepositTarget {
    /// https://zenodo.org
    #[default]
    Production,
    /// https://sandbox.zenodo.org
    Sandbox,
}

impl DepositTarget {
    /// Base URL of the instance
    pub fn base_url(&self) -> &'static str {
        match self {
            DepositTarget::Production => "https://zenodo.org",
            DepositTarget::Sandbox => "https://sandbox.zenodo.org",
        }
    }
}

/// Which metadata documents take part in the release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetadataSelection {
    /// `codemeta.json`
    pub codemeta_json: bool,
    /// `CITATION.cff`
    pub citation_cff: bool,
    /// `.zenodo.json`
    pub zenodo_json: bool,
}

impl MetadataSelection {
    /// Selected documents in processing order
    pub fn kinds(&self) -> Vec<MetadataKind> {
        let mut kinds = Vec::new();
        if self.codemeta_json {
            kinds.push(MetadataKind::CodeMeta);
        }
        if self.citation_cff {
            kinds.push(MetadataKind::Citation);
        }
        if self.zenodo_json {
            kinds.push(MetadataKind::ZenodoJson);
        }
        kinds
    }
}

/// Committer identity and commit message template for metadata commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitterOptions {
    /// Committer name, empty for the token owner
    pub name: String,
    /// Committer email, empty for the token owner
    pub email: String,
    /// Commit message template containing `${file_name}`
    pub message: String,
}

impl Default for CommitterOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }
}

impl CommitterOptions {
    /// Whether any of the committer settings differs from the defaults
    pub fn is_custom(&self) -> bool {
        !self.name.is_empty() || !self.email.is_empty() || self.message != DEFAULT_COMMIT_MESSAGE
    }
}

/// Operator-supplied options
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    /// Rewrite and push metadata documents
    pub update_metadata_files: bool,
    /// Documents taking part in the release
    pub documents: MetadataSelection,
    /// Committer override
    pub committer: CommitterOptions,
    /// Deposition the new version derives from
    pub deposition_id: String,
    /// Production or sandbox Zenodo
    pub target: DepositTarget,
    /// Publish the draft at the end, or leave it for review
    pub publish: bool,
}

/// Identity sent with contents API writes when a custom committer is configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitterIdentity {
    /// Committer name
    pub name: String,
    /// Committer email
    pub email: String,
}

/// Immutable description of the release being archived
#[derive(Debug)]
pub struct ReleaseContext {
    repository: String,
    default_branch: String,
    tag: NormalizedTag,
    assets: Vec<ReleaseAsset>,
    update_metadata_files: bool,
    documents: MetadataSelection,
    committer: CommitterOptions,
    custom_committer: bool,
    original_deposition_id: String,
    target: DepositTarget,
    publish: bool,
    draft_id: OnceLock<String>,
    doi: OnceLock<String>,
}

impl ReleaseContext {
    /// Validate the release event and combine it with the operator options
    pub fn build(event: &ReleaseEvent, options: ReleaseOptions) -> Result<Self> {
        let repository = event
            .repository
            .as_ref()
            .ok_or_else(|| missing("repository"))?;
        let full_name = non_empty(repository.full_name.as_deref(), "repository.full_name")?;
        let default_branch =
            non_empty(repository.default_branch.as_deref(), "repository.default_branch")?;

        if full_name.split('/').filter(|part| !part.is_empty()).count() != 2 {
            return Err(ConfigError::InvalidValue {
                field: "repository.full_name".to_string(),
                reason: format!("'{}' is not in owner/name form", full_name),
            }
            .into());
        }

        let release = event.release.as_ref().ok_or_else(|| missing("release"))?;
        let tag_name = non_empty(release.tag_name.as_deref(), "release.tag_name")?;
        let assets = release
            .assets
            .clone()
            .ok_or_else(|| missing("release.assets"))?;

        if options.deposition_id.trim().is_empty() {
            return Err(missing("zenodo_deposition_id"));
        }

        let tag = NormalizedTag::parse(tag_name);
        let custom_committer = options.committer.is_custom();

        log::debug!(
            "Release context: repository={} branch={} tag={} custom_committer={}",
            full_name,
            default_branch,
            tag,
            custom_committer
        );

        Ok(Self {
            repository: full_name.to_string(),
            default_branch: default_branch.to_string(),
            tag,
            assets,
            update_metadata_files: options.update_metadata_files,
            documents: options.documents,
            committer: options.committer,
            custom_committer,
            original_deposition_id: options.deposition_id.trim().to_string(),
            target: options.target,
            publish: options.publish,
            draft_id: OnceLock::new(),
            doi: OnceLock::new(),
        })
    }

    /// `owner/name`
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Repository owner
    pub fn owner(&self) -> &str {
        self.repository.split('/').next().unwrap_or_default()
    }

    /// Repository name without owner
    pub fn repository_name(&self) -> &str {
        self.repository.rsplit('/').next().unwrap_or_default()
    }

    /// Default branch
    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    /// Normalized release tag
    pub fn tag(&self) -> &NormalizedTag {
        &self.tag
    }

    /// Normalized release tag as written into metadata documents
    pub fn tag_name(&self) -> String {
        self.tag.to_string()
    }

    /// Assets attached to the release
    pub fn assets(&self) -> &[ReleaseAsset] {
        &self.assets
    }

    /// Whether metadata documents are rewritten and pushed
    pub fn update_metadata_files(&self) -> bool {
        self.update_metadata_files
    }

    /// Selected metadata documents
    pub fn documents(&self) -> &MetadataSelection {
        &self.documents
    }

    /// Whether contents API writes carry an explicit committer
    pub fn custom_committer(&self) -> bool {
        self.custom_committer
    }

    /// Committer to send with contents API writes, if any.
    ///
    /// A custom commit message alone keeps the token owner as committer.
    pub fn committer_identity(&self) -> Option<CommitterIdentity> {
        let has_identity = !self.committer.name.is_empty() || !self.committer.email.is_empty();
        (self.custom_committer && has_identity).then(|| CommitterIdentity {
            name: self.committer.name.clone(),
            email: self.committer.email.clone(),
        })
    }

    /// Commit message for the given metadata file
    pub fn commit_message(&self, file_name: &str) -> String {
        self.committer.message.replace(FILE_NAME_PLACEHOLDER, file_name)
    }

    /// Deposition the new version is created from
    pub fn original_deposition_id(&self) -> &str {
        &self.original_deposition_id
    }

    /// Zenodo base URL
    pub fn zenodo_url(&self) -> &'static str {
        self.target.base_url()
    }

    /// Whether the draft is published at the end of the run
    pub fn publish(&self) -> bool {
        self.publish
    }

    /// Draft deposition id, once the draft exists
    pub fn draft_id(&self) -> Option<&str> {
        self.draft_id.get().map(String::as_str)
    }

    /// DOI of the draft deposition, once the draft exists
    pub fn doi(&self) -> Option<&str> {
        self.doi.get().map(String::as_str)
    }

    /// Record the draft of this run. A context only ever holds one draft.
    pub fn bind_draft(&self, draft_id: &str, doi: &str) -> Result<()> {
        if self.draft_id.get().is_some() || self.doi.get().is_some() {
            return Err(ConfigError::InvalidValue {
                field: "draft_id".to_string(),
                reason: format!(
                    "draft {} is already bound to this release",
                    self.draft_id().unwrap_or_default()
                ),
            }
            .into());
        }
        if doi.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "doi".to_string(),
                reason: format!("deposition {} has no DOI", draft_id),
            }
            .into());
        }

        let _ = self.draft_id.set(draft_id.to_string());
        let _ = self.doi.set(doi.to_string());
        Ok(())
    }

    /// DOI, or an error when asked for before the draft is bound
    pub fn require_doi(&self) -> Result<&str> {
        self.doi().ok_or_else(|| missing("doi"))
    }
}

fn missing(field: &str) -> ReleaseError {
    ConfigError::MissingField {
        field: field.to_string(),
    }
    .into()
}

fn non_empty<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(missing(field)),
    }
}
