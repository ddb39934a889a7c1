//! Command execution.
//!
//! Validates the arguments, runs the release and turns the outcome into an
//! exit code with user feedback.

mod outputs;
mod release;

use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;

pub use outputs::write_step_outputs;
use release::execute_release;

/// Execute the release described by the parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    let config = RuntimeConfig::from(&args);

    if let Err(validation_error) = args.validate() {
        config.error_println(&format!("Invalid arguments: {}", validation_error));
        print_suggestions(&config, validation_error.recovery_suggestions());
        return Ok(1);
    }

    match execute_release(&args, &config).await {
        Ok(()) => Ok(0),
        Err(e) => {
            config.error_println(&format!("Zenodo release failed: {}", e));
            print_suggestions(&config, e.recovery_suggestions());
            Ok(1)
        }
    }
}

fn print_suggestions(config: &RuntimeConfig, suggestions: Vec<String>) {
    if suggestions.is_empty() {
        return;
    }

    config.println("\n💡 Recovery suggestions:");
    for suggestion in suggestions {
        config.indent(&format!("• {}", suggestion));
    }
}
