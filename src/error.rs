//! Error types for zenodo_release operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use crate::deposit::DraftState;
use std::fmt;
use thiserror::Error;

/// Result type alias for zenodo_release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Remote service a request was sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteService {
    /// Source host (GitHub REST API)
    GitHub,
    /// Deposit service (Zenodo REST API)
    Zenodo,
}

impl fmt::Display for RemoteService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteService::GitHub => write!(f, "GitHub"),
            RemoteService::Zenodo => write!(f, "Zenodo"),
        }
    }
}

/// Main error type for all zenodo_release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Missing or invalid operator input / event payload
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Requested remote document does not exist
    #[error("{service} resource not found: {resource}")]
    NotFound {
        /// Service that answered 404
        service: RemoteService,
        /// Path or identifier that was requested
        resource: String,
    },

    /// Local metadata document could not be parsed, rewritten or written
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Non-success response or transport failure from a remote API
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Operation attempted on a draft that is no longer open
    #[error("Cannot {operation} deposition {draft_id}: draft is {state}")]
    InvalidDraftState {
        /// Draft deposition id
        draft_id: String,
        /// State the draft was in
        state: DraftState,
        /// Operation that was refused
        operation: &'static str,
    },

    /// The workflow failed and deleting the draft failed as well
    #[error("{source} (draft {draft_id} could not be deleted: {cleanup})")]
    Compensation {
        /// Error that triggered the compensation
        #[source]
        source: Box<ReleaseError>,
        /// Draft that is still open on the deposit service
        draft_id: String,
        /// Why the delete failed
        cleanup: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration and event payload errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required field absent from the inputs or the release event
    #[error("Missing required field: {field}")]
    MissingField {
        /// Field name
        field: String,
    },

    /// Field present but unusable
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for the error
        reason: String,
    },
}

/// Metadata document errors
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Document could not be read from the staging directory
    #[error("Failed to read {document}: {source}")]
    ReadFailed {
        /// Document file name
        document: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Document content is not valid JSON / YAML
    #[error("Failed to parse {document}: {reason}")]
    ParseFailed {
        /// Document file name
        document: String,
        /// Reason for the error
        reason: String,
    },

    /// Document parsed but does not have the expected shape
    #[error("Unexpected structure in {document}: {reason}")]
    InvalidStructure {
        /// Document file name
        document: String,
        /// Reason for the error
        reason: String,
    },

    /// Updated document could not be persisted
    #[error("Failed to write {document}: {source}")]
    WriteFailed {
        /// Document file name
        document: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Remote API errors
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The service answered with an unexpected status code
    #[error("{service} {operation} failed with status {status}: {body}")]
    Status {
        /// Service that answered
        service: RemoteService,
        /// Operation that was attempted
        operation: String,
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// The request never produced a response
    #[error("{service} {operation} failed: {reason}")]
    Transport {
        /// Service that was contacted
        service: RemoteService,
        /// Operation that was attempted
        operation: String,
        /// Reason for the error
        reason: String,
    },

    /// A success response did not contain what was expected
    #[error("{service} {operation} returned an unusable response: {reason}")]
    InvalidResponse {
        /// Service that answered
        service: RemoteService,
        /// Operation that was attempted
        operation: String,
        /// Reason for the error
        reason: String,
    },
}

impl RemoteError {
    /// HTTP status, when the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Configuration(ConfigError::MissingField { field }) => vec![
                format!("Provide '{}' as a flag or environment variable", field),
                "Run from a workflow triggered by a `release` event".to_string(),
            ],
            ReleaseError::NotFound {
                service: RemoteService::GitHub,
                resource,
            } => vec![
                format!("Commit {} to the default branch", resource),
                "Or disable that metadata file in the inputs".to_string(),
            ],
            ReleaseError::Remote(RemoteError::Status { status: 401, .. })
            | ReleaseError::Remote(RemoteError::Status { status: 403, .. }) => vec![
                "Verify the access token is valid and has write permissions".to_string(),
            ],
            ReleaseError::Remote(RemoteError::Status {
                service: RemoteService::GitHub,
                status: 409,
                ..
            }) => vec![
                "The file changed on the default branch during the run; re-run the release job"
                    .to_string(),
            ],
            ReleaseError::Metadata(_) => vec![
                "Validate the metadata file syntax locally before releasing".to_string(),
            ],
            ReleaseError::Compensation { draft_id, .. } => vec![
                format!("Delete draft deposition {} manually in the Zenodo UI", draft_id),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Whether this error comes from one of the remote APIs
    pub fn is_remote(&self) -> bool {
        match self {
            ReleaseError::Remote(_) | ReleaseError::NotFound { .. } => true,
            ReleaseError::Compensation { source, .. } => source.is_remote(),
            _ => false,
        }
    }
}
