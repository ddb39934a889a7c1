//! `codemeta.json` rewriting.

use crate::error::{MetadataError, Result};
use serde_json::Value;

const DOCUMENT: &str = "codemeta.json";

/// Set `version`, `identifier` and `dateModified`, keeping every other field and the key order
pub fn rewrite_codemeta(content: &str, version: &str, doi: &str, date: &str) -> Result<String> {
    let mut value: Value = serde_json::from_str(content).map_err(|e| MetadataError::ParseFailed {
        document: DOCUMENT.to_string(),
        reason: e.to_string(),
    })?;

    let object = value
        .as_object_mut()
        .ok_or_else(|| MetadataError::InvalidStructure {
            document: DOCUMENT.to_string(),
            reason: "top level must be an object".to_string(),
        })?;

    object.insert("version".to_string(), Value::String(version.to_string()));
    object.insert("identifier".to_string(), Value::String(doi.to_string()));
    object.insert("dateModified".to_string(), Value::String(date.to_string()));

    let mut updated = serde_json::to_string_pretty(&value)?;
    updated.push('\n');
    Ok(updated)
}
