//! Release command execution.

use super::write_step_outputs;
use crate::cli::{Args, RuntimeConfig};
use crate::context::{ReleaseContext, ReleaseEvent};
use crate::deposit::ZenodoClient;
use crate::error::{ConfigError, Result};
use crate::github::GitHubClient;
use crate::release::ReleaseOrchestrator;
use crate::workspace::Workspace;

/// Run one release from the event payload to a new Zenodo version
pub(super) async fn execute_release(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let event_path = args
        .event_path
        .as_deref()
        .ok_or_else(|| ConfigError::MissingField {
            field: "event_path".to_string(),
        })?;

    config.println("📦 Reading release event...");
    let event = ReleaseEvent::from_file(event_path)?;
    let context = ReleaseContext::build(&event, args.release_options())?;

    config.indent(&format!("Repository: {}", context.repository()));
    config.indent(&format!("Tag: {}", context.tag_name()));
    config.indent(&format!("Zenodo: {}", context.zenodo_url()));
    if context.custom_committer() {
        config.indent("Using custom committer for metadata commits");
    }

    let source = GitHubClient::with_api_url(args.github_token()?, &args.github_api_url)?;
    let deposit = ZenodoClient::new(context.zenodo_url(), args.zenodo_token()?)?;
    let workspace = Workspace::create(&args.work_dir)?;

    config.println(&format!(
        "🚀 Creating new version of deposition {}...",
        context.original_deposition_id()
    ));
    let outcome = ReleaseOrchestrator::new(context, &source, &deposit, workspace)
        .run()
        .await?;

    if outcome.published() {
        config.success_println(&format!(
            "Published version {} with DOI {}",
            outcome.tag, outcome.doi
        ));
    } else {
        config.success_println(&format!(
            "Draft {} for version {} is ready for review (DOI {})",
            outcome.draft_id, outcome.tag, outcome.doi
        ));
    }

    if let Some(path) = &args.output_file
        && let Err(e) = write_step_outputs(path, &outcome)
    {
        config.warning_println(&format!(
            "Could not write step outputs to {}: {}",
            path.display(),
            e
        ));
    }

    Ok(())
}
