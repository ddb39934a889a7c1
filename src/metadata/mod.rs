//! Metadata documents kept in sync with the deposit.
//!
//! Three documents are known: `codemeta.json`, `CITATION.cff` and
//! `.zenodo.json`. The first two carry the release version, DOI and date and
//! are rewritten on every release; the last is handed to Zenodo as the
//! deposition metadata without modification.

mod citation;
mod codemeta;

pub use citation::{DOI_DESCRIPTION, rewrite_citation};
pub use codemeta::rewrite_codemeta;

use crate::context::ReleaseContext;
use crate::error::{MetadataError, Result};
use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};

/// Known metadata documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    /// `codemeta.json`: JSON description record
    CodeMeta,
    /// `CITATION.cff`: YAML citation file with an `identifiers` list
    Citation,
    /// `.zenodo.json`: Zenodo deposition metadata
    ZenodoJson,
}

impl MetadataKind {
    /// File name at the repository root
    pub fn file_name(&self) -> &'static str {
        match self {
            MetadataKind::CodeMeta => "codemeta.json",
            MetadataKind::Citation => "CITATION.cff",
            MetadataKind::ZenodoJson => ".zenodo.json",
        }
    }

    /// Whether the document is rewritten on release
    pub fn is_rewritten(&self) -> bool {
        !matches!(self, MetadataKind::ZenodoJson)
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// A metadata document staged on local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDocument {
    /// Document kind
    pub kind: MetadataKind,
    /// Local copy in the staging directory
    pub path: PathBuf,
}

impl MetadataDocument {
    /// Document of the given kind inside `dir`
    pub fn in_dir(kind: MetadataKind, dir: &Path) -> Self {
        Self {
            kind,
            path: dir.join(kind.file_name()),
        }
    }

    /// Path on the source host (repository root)
    pub fn remote_path(&self) -> &'static str {
        self.kind.file_name()
    }

    /// Read the staged content
    pub fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|source| {
            MetadataError::ReadFailed {
                document: self.kind.to_string(),
                source,
            }
            .into()
        })
    }

    /// Replace the staged content
    pub fn write(&self, content: &str) -> Result<()> {
        std::fs::write(&self.path, content).map_err(|source| {
            MetadataError::WriteFailed {
                document: self.kind.to_string(),
                source,
            }
            .into()
        })
    }

    /// Parse the staged `.zenodo.json` into the object sent to Zenodo
    pub fn load_deposit_metadata(&self) -> Result<serde_json::Value> {
        let content = self.read()?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| MetadataError::ParseFailed {
                document: self.kind.to_string(),
                reason: e.to_string(),
            })?;

        if !value.is_object() {
            return Err(MetadataError::InvalidStructure {
                document: self.kind.to_string(),
                reason: "top level must be an object".to_string(),
            }
            .into());
        }
        Ok(value)
    }
}

/// Rewrites version, DOI and date fields of staged documents
pub struct MetadataRewriter<'a> {
    context: &'a ReleaseContext,
    today: NaiveDate,
}

impl<'a> MetadataRewriter<'a> {
    /// Rewriter stamping documents with the current local date
    pub fn new(context: &'a ReleaseContext) -> Self {
        Self::with_date(context, chrono::Local::now().date_naive())
    }

    /// Rewriter stamping documents with a fixed date
    pub fn with_date(context: &'a ReleaseContext, today: NaiveDate) -> Self {
        Self { context, today }
    }

    /// Date written into `dateModified` / `date-released`
    pub fn date_string(&self) -> String {
        self.today.format("%Y-%m-%d").to_string()
    }

    /// Rewrite the document's content without touching the disk.
    ///
    /// Returns `None` for documents that are not rewritten.
    pub fn rewrite_content(&self, kind: MetadataKind, content: &str) -> Result<Option<String>> {
        let doi = self.context.require_doi()?;
        let version = self.context.tag_name();
        let date = self.date_string();

        match kind {
            MetadataKind::CodeMeta => rewrite_codemeta(content, &version, doi, &date).map(Some),
            MetadataKind::Citation => rewrite_citation(content, &version, doi, &date).map(Some),
            MetadataKind::ZenodoJson => Ok(None),
        }
    }

    /// Rewrite a staged document and persist it in place
    pub fn rewrite(&self, document: &MetadataDocument) -> Result<()> {
        if !document.kind.is_rewritten() {
            log::debug!("{} is sent to Zenodo unchanged", document.kind);
            return Ok(());
        }

        log::info!("Updating {}", document.path.display());
        let content = document.read()?;
        if let Some(updated) = self.rewrite_content(document.kind, &content)? {
            document.write(&updated)?;
        }
        log::info!("Updated {}", document.path.display());
        Ok(())
    }
}
