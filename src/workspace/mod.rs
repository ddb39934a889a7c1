//! Local staging area for a release run.
//!
//! Metadata documents and release assets are kept in separate directories so
//! that only the assets (and the source snapshot) end up on Zenodo.

use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

/// Directory holding downloaded metadata documents
pub const METADATA_DIR: &str = "metadata";

/// Directory holding release assets and the source snapshot
pub const RELEASE_ASSETS_DIR: &str = "release-assets";

/// A file staged for upload to the deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAsset {
    /// Upload name
    pub name: String,
    /// Local path
    pub path: PathBuf,
}

/// Staging directories under a work directory
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    metadata_dir: PathBuf,
    assets_dir: PathBuf,
}

impl Workspace {
    /// Create (if needed) the staging directories under `root`
    pub fn create(root: &Path) -> Result<Self> {
        let metadata_dir = root.join(METADATA_DIR);
        let assets_dir = root.join(RELEASE_ASSETS_DIR);

        std::fs::create_dir_all(&metadata_dir)?;
        std::fs::create_dir_all(&assets_dir)?;
        log::debug!(
            "Staging in {} and {}",
            metadata_dir.display(),
            assets_dir.display()
        );

        Ok(Self {
            root: root.to_path_buf(),
            metadata_dir,
            assets_dir,
        })
    }

    /// Work directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for metadata documents
    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    /// Directory for release assets
    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Local destination for a release asset.
    ///
    /// Asset names come from the release event; anything that would escape the
    /// assets directory is rejected.
    pub fn asset_path(&self, name: &str) -> Result<StagedAsset> {
        let is_plain_name = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);

        if !is_plain_name {
            return Err(ConfigError::InvalidValue {
                field: "release.assets[].name".to_string(),
                reason: format!("'{}' is not a plain file name", name),
            }
            .into());
        }

        Ok(StagedAsset {
            name: name.to_string(),
            path: self.assets_dir.join(name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_makes_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = Workspace::create(dir.path()).expect("created");
        assert!(workspace.metadata_dir().is_dir());
        assert!(workspace.assets_dir().is_dir());

        // Idempotent
        Workspace::create(dir.path()).expect("created again");
    }

    #[test]
    fn test_asset_path_rejects_traversal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = Workspace::create(dir.path()).expect("created");

        assert!(workspace.asset_path("../secrets").is_err());
        assert!(workspace.asset_path("nested/file.zip").is_err());
        assert!(workspace.asset_path("..").is_err());
        assert!(workspace.asset_path("").is_err());

        let asset = workspace.asset_path("tool.tar.gz").expect("plain name");
        assert_eq!(asset.path, workspace.assets_dir().join("tool.tar.gz"));
    }
}
