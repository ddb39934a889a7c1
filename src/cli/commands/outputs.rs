//! Step outputs for the workflow runner.

use crate::error::Result;
use crate::release::ReleaseOutcome;
use std::io::Write;
use std::path::Path;

/// Append `doi=` and `version=` lines to the runner's output file
pub fn write_step_outputs(path: &Path, outcome: &ReleaseOutcome) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    writeln!(file, "doi={}", outcome.doi)?;
    writeln!(file, "version={}", outcome.tag)?;
    log::debug!("Wrote step outputs to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deposit::DraftState;

    #[test]
    fn test_outputs_are_appended() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("output");
        std::fs::write(&path, "previous=1\n").expect("seed");

        let outcome = ReleaseOutcome {
            tag: "1.0.2".to_string(),
            doi: "10.5281/zenodo.456".to_string(),
            draft_id: "456".to_string(),
            state: DraftState::Published,
        };
        write_step_outputs(&path, &outcome).expect("written");

        let content = std::fs::read_to_string(&path).expect("read");
        assert_eq!(
            content,
            "previous=1\ndoi=10.5281/zenodo.456\nversion=1.0.2\n"
        );
    }
}
