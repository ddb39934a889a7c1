//! Command line argument parsing and validation.
//!
//! Every option can also be given through the environment, using the
//! `INPUT_*` names a GitHub Actions runner sets for action inputs. Runners set
//! unset inputs to the empty string, so empty values count as absent.

use crate::context::{
    CommitterOptions, DEFAULT_COMMIT_MESSAGE, DepositTarget, MetadataSelection, ReleaseOptions,
};
use crate::error::{ConfigError, Result};
use crate::github::DEFAULT_API_URL;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Archive a GitHub release as a new Zenodo version
#[derive(Parser, Debug, Clone)]
#[command(
    name = "zenodo_release",
    version,
    args_override_self = true,
    about = "Archive a GitHub release as a new version of a Zenodo deposition",
    long_about = "Create a new version of a Zenodo deposition for a GitHub release.

The release assets and a zip snapshot of the default branch are uploaded to the
new version. codemeta.json and CITATION.cff are updated with the new version,
DOI and date and committed back to the repository; .zenodo.json is used as the
deposition metadata.

Usage:
  zenodo_release --zenodo-deposition-id 123 --event-path event.json --codemeta-json true
  INPUT_ZENODO_SANDBOX=true zenodo_release"
)]
pub struct Args {
    /// GitHub token with contents write access
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Zenodo personal access token (deposit:write, deposit:actions)
    #[arg(long, env = "INPUT_ZENODO_TOKEN", hide_env_values = true)]
    pub zenodo_token: Option<String>,

    /// Id of any deposition of the Zenodo record to version
    #[arg(long, env = "INPUT_ZENODO_DEPOSITION_ID")]
    pub zenodo_deposition_id: Option<String>,

    /// Release event payload
    #[arg(long, env = "GITHUB_EVENT_PATH", value_name = "FILE")]
    pub event_path: Option<PathBuf>,

    /// Rewrite metadata files and commit them to the repository
    #[arg(long, env = "INPUT_UPDATE_METADATA_FILES", value_name = "BOOL", action = ArgAction::Set, value_parser = parse_input_flag)]
    pub update_metadata_files: Option<InputFlag>,

    /// Manage codemeta.json
    #[arg(long, env = "INPUT_CODEMETA_JSON", value_name = "BOOL", action = ArgAction::Set, value_parser = parse_input_flag)]
    pub codemeta_json: Option<InputFlag>,

    /// Manage CITATION.cff
    #[arg(long, env = "INPUT_CITATION_CFF", value_name = "BOOL", action = ArgAction::Set, value_parser = parse_input_flag)]
    pub citation_cff: Option<InputFlag>,

    /// Use .zenodo.json as the deposition metadata
    #[arg(long, env = "INPUT_ZENODO_JSON", value_name = "BOOL", action = ArgAction::Set, value_parser = parse_input_flag)]
    pub zenodo_json: Option<InputFlag>,

    /// Committer name for metadata commits
    #[arg(long, env = "INPUT_COMMITTER_NAME", default_value = "")]
    pub committer_name: String,

    /// Committer email for metadata commits
    #[arg(long, env = "INPUT_COMMITTER_EMAIL", default_value = "")]
    pub committer_email: String,

    /// Commit message for metadata commits; `${file_name}` is replaced by the file name
    #[arg(long, env = "INPUT_COMMIT_MESSAGE", default_value = DEFAULT_COMMIT_MESSAGE)]
    pub commit_message: String,

    /// Use https://sandbox.zenodo.org
    #[arg(long, env = "INPUT_ZENODO_SANDBOX", value_name = "BOOL", action = ArgAction::Set, value_parser = parse_input_flag)]
    pub zenodo_sandbox: Option<InputFlag>,

    /// Publish the new version; otherwise it is left as a draft for review
    #[arg(long, env = "INPUT_ZENODO_PUBLISH", value_name = "BOOL", action = ArgAction::Set, value_parser = parse_input_flag)]
    pub zenodo_publish: Option<InputFlag>,

    /// GitHub API root
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub github_api_url: String,

    /// Directory for the `metadata/` and `release-assets/` staging folders
    #[arg(long, env = "INPUT_WORK_DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// File receiving `doi=` and `version=` step outputs
    #[arg(long, env = "GITHUB_OUTPUT", value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<()> {
        required(&self.github_token, "github_token")?;
        required(&self.zenodo_token, "zenodo_token")?;
        let deposition_id = required(&self.zenodo_deposition_id, "zenodo_deposition_id")?;

        if !deposition_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidValue {
                field: "zenodo_deposition_id".to_string(),
                reason: format!("'{}' is not a numeric deposition id", deposition_id),
            }
            .into());
        }

        required(
            &self.event_path.as_ref().map(|p| p.display().to_string()),
            "event_path",
        )?;

        Ok(())
    }

    /// GitHub token (call after [`validate`](Self::validate))
    pub fn github_token(&self) -> Result<&str> {
        required(&self.github_token, "github_token")
    }

    /// Zenodo token (call after [`validate`](Self::validate))
    pub fn zenodo_token(&self) -> Result<&str> {
        required(&self.zenodo_token, "zenodo_token")
    }

    /// Options for building the release context
    pub fn release_options(&self) -> ReleaseOptions {
        let message = if self.commit_message.trim().is_empty() {
            DEFAULT_COMMIT_MESSAGE.to_string()
        } else {
            self.commit_message.clone()
        };

        ReleaseOptions {
            update_metadata_files: resolve(self.update_metadata_files, true),
            documents: MetadataSelection {
                codemeta_json: resolve(self.codemeta_json, false),
                citation_cff: resolve(self.citation_cff, false),
                zenodo_json: resolve(self.zenodo_json, false),
            },
            committer: CommitterOptions {
                name: self.committer_name.trim().to_string(),
                email: self.committer_email.trim().to_string(),
                message,
            },
            deposition_id: self
                .zenodo_deposition_id
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            target: if resolve(self.zenodo_sandbox, false) {
                DepositTarget::Sandbox
            } else {
                DepositTarget::Production
            },
            publish: resolve(self.zenodo_publish, false),
        }
    }
}

/// Value of a boolean input. Runners pass unset inputs as `""`, which is kept
/// apart from an explicit `false` so the input's own default applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFlag {
    /// `true`, `yes`, `y`, `on` or `1`
    Enabled,
    /// `false`, `no`, `n`, `off` or `0`
    Disabled,
    /// Empty value
    Unset,
}

fn parse_input_flag(value: &str) -> std::result::Result<InputFlag, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(InputFlag::Unset),
        "true" | "yes" | "y" | "on" | "1" => Ok(InputFlag::Enabled),
        "false" | "no" | "n" | "off" | "0" => Ok(InputFlag::Disabled),
        other => Err(format!("'{}' is not a boolean (use true or false)", other)),
    }
}

fn resolve(flag: Option<InputFlag>, default: bool) -> bool {
    match flag {
        Some(InputFlag::Enabled) => true,
        Some(InputFlag::Disabled) => false,
        Some(InputFlag::Unset) | None => default,
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingField {
            field: field.to_string(),
        }
        .into()),
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(quiet),
        }
    }

    /// Print message
    pub fn println(&self, message: &str) {
        self.output.println(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        self.output.success(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        self.output.indent(message);
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(false)
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.quiet)
    }
}
