//! # Zenodo Release
//!
//! Archive a GitHub release as a new version of a Zenodo deposition.
//!
//! A run creates a new draft version of an existing deposition, stamps the
//! reserved DOI and the release version into `codemeta.json` and
//! `CITATION.cff`, commits those back to the default branch, replaces the
//! draft's files with the release assets and a zip snapshot of the source,
//! applies `.zenodo.json` as the deposition metadata and publishes.
//!
//! ## Features
//!
//! - **All-or-nothing drafts**: any failure after the draft exists deletes it
//! - **Metadata sync**: the DOI written to GitHub is the DOI of the published version
//! - **Sandbox support**: target `sandbox.zenodo.org` for dry runs
//! - **Review mode**: leave the new version as a draft instead of publishing
//!
//! ## Usage
//!
//! ```bash
//! zenodo_release --zenodo-deposition-id 123 --event-path event.json --codemeta-json true
//! INPUT_ZENODO_SANDBOX=true zenodo_release
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod context;
pub mod deposit;
pub mod error;
pub mod github;
pub mod http;
pub mod metadata;
pub mod release;
pub mod version;
pub mod workspace;

pub use cli::Args;
pub use context::{ReleaseContext, ReleaseEvent, ReleaseOptions};
pub use deposit::{DepositDraft, DepositService, DraftState, ZenodoClient};
pub use error::{ReleaseError, Result};
pub use github::{GitHubClient, SourceHost};
pub use release::{ReleaseOrchestrator, ReleaseOutcome};
pub use workspace::Workspace;
