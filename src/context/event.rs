//! Release event payload as delivered by GitHub.
//!
//! Only the fields the workflow reads are modelled. Every field is optional at
//! the serde level so that a missing one is reported by name instead of as a
//! generic deserialization failure.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `release` webhook payload
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReleaseEvent {
    /// Repository the release belongs to
    pub repository: Option<EventRepository>,
    /// Release that triggered the run
    pub release: Option<EventRelease>,
}

/// `repository` object of the payload
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventRepository {
    /// `owner/name`
    pub full_name: Option<String>,
    /// Branch the snapshot and metadata commits target
    pub default_branch: Option<String>,
}

/// `release` object of the payload
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventRelease {
    /// Tag the release was cut from
    pub tag_name: Option<String>,
    /// Files attached to the release
    pub assets: Option<Vec<ReleaseAsset>>,
}

/// File attached to a GitHub release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReleaseAsset {
    /// File name, also used as the upload name on Zenodo
    pub name: String,
    /// Direct download URL
    pub browser_download_url: String,
}

impl ReleaseEvent {
    /// Load the payload from the event file written by the runner
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidValue {
            field: "event_path".to_string(),
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json(&content)
    }

    /// Parse the payload from its JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            ConfigError::InvalidValue {
                field: "event".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}
