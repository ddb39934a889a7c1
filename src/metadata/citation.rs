//! `CITATION.cff` rewriting.

use crate::error::{MetadataError, Result};
use serde_yaml::{Mapping, Value};

const DOCUMENT: &str = "CITATION.cff";

/// Description of the identifier entry created when the file has none
pub const DOI_DESCRIPTION: &str = "DOI for this application's record on Zenodo";

/// Set `version`, `date-released` and the DOI entry of `identifiers`.
///
/// The DOI entry is the first identifier with `type: doi`. Files written by
/// hand sometimes list a URL or SWH id first, so position zero is only used
/// when no entry declares a type of `doi`.
pub fn rewrite_citation(content: &str, version: &str, doi: &str, date: &str) -> Result<String> {
    let mut value: Value = serde_yaml::from_str(content).map_err(|e| MetadataError::ParseFailed {
        document: DOCUMENT.to_string(),
        reason: e.to_string(),
    })?;

    let root = value
        .as_mapping_mut()
        .ok_or_else(|| invalid("top level must be a mapping"))?;

    root.insert(key("version"), Value::String(version.to_string()));
    root.insert(key("date-released"), Value::String(date.to_string()));

    if matches!(root.get("identifiers"), None | Some(Value::Null)) {
        root.insert(key("identifiers"), Value::Sequence(vec![doi_entry(doi)]));
    } else {
        match root.get_mut("identifiers") {
            Some(Value::Sequence(identifiers)) => set_doi(identifiers, doi)?,
            _ => return Err(invalid("'identifiers' must be a list").into()),
        }
    }

    serde_yaml::to_string(&value).map_err(|e| {
        MetadataError::ParseFailed {
            document: DOCUMENT.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn set_doi(identifiers: &mut Vec<Value>, doi: &str) -> Result<()> {
    if identifiers.is_empty() {
        identifiers.push(doi_entry(doi));
        return Ok(());
    }

    let index = identifiers
        .iter()
        .position(|entry| entry.get("type").and_then(Value::as_str) == Some("doi"))
        .unwrap_or(0);

    let entry = identifiers[index]
        .as_mapping_mut()
        .ok_or_else(|| invalid("identifier entries must be mappings"))?;
    entry.insert(key("value"), Value::String(doi.to_string()));
    Ok(())
}

fn doi_entry(doi: &str) -> Value {
    let mut entry = Mapping::new();
    entry.insert(key("description"), Value::String(DOI_DESCRIPTION.to_string()));
    entry.insert(key("type"), Value::String("doi".to_string()));
    entry.insert(key("value"), Value::String(doi.to_string()));
    Value::Mapping(entry)
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

fn invalid(reason: &str) -> MetadataError {
    MetadataError::InvalidStructure {
        document: DOCUMENT.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOI: &str = "10.5281/zenodo.456";

    fn rewrite(input: &str) -> Value {
        let output = rewrite_citation(input, "1.0.2", DOI, "2024-06-30").expect("rewrites");
        serde_yaml::from_str(&output).expect("output is yaml")
    }

    #[test]
    fn test_creates_identifiers_when_missing() {
        let value = rewrite("cff-version: 1.2.0\ntitle: tool\nversion: 0.1.0\n");
        assert_eq!(value["version"].as_str(), Some("1.0.2"));
        assert_eq!(value["date-released"].as_str(), Some("2024-06-30"));
        assert_eq!(value["title"].as_str(), Some("tool"));

        let identifiers = value["identifiers"].as_sequence().expect("list created");
        assert_eq!(identifiers.len(), 1);
        assert_eq!(identifiers[0]["type"].as_str(), Some("doi"));
        assert_eq!(identifiers[0]["value"].as_str(), Some(DOI));
        assert_eq!(identifiers[0]["description"].as_str(), Some(DOI_DESCRIPTION));
    }

    #[test]
    fn test_overwrites_first_entry() {
        let value = rewrite(
            "title: tool\nidentifiers:\n  - type: doi\n    value: 10.5281/zenodo.123\n  - type: url\n    value: https://example.com\n",
        );
        let identifiers = value["identifiers"].as_sequence().expect("list kept");
        assert_eq!(identifiers.len(), 2);
        assert_eq!(identifiers[0]["value"].as_str(), Some(DOI));
        assert_eq!(identifiers[1]["value"].as_str(), Some("https://example.com"));
    }

    #[test]
    fn test_finds_doi_entry_by_type() {
        let value = rewrite(
            "title: tool\nidentifiers:\n  - type: url\n    value: https://example.com\n  - type: doi\n    value: 10.5281/zenodo.123\n",
        );
        let identifiers = value["identifiers"].as_sequence().expect("list kept");
        assert_eq!(identifiers[0]["value"].as_str(), Some("https://example.com"));
        assert_eq!(identifiers[1]["value"].as_str(), Some(DOI));
    }

    #[test]
    fn test_untyped_list_uses_first_entry() {
        let value = rewrite("identifiers:\n  - value: old\n");
        assert_eq!(value["identifiers"][0]["value"].as_str(), Some(DOI));
    }

    #[test]
    fn test_empty_list_gets_entry() {
        let value = rewrite("identifiers: []\n");
        assert_eq!(value["identifiers"][0]["value"].as_str(), Some(DOI));
    }

    #[test]
    fn test_rejects_scalar_identifiers() {
        assert!(rewrite_citation("identifiers: 3\n", "1.0.2", DOI, "2024-06-30").is_err());
    }

    #[test]
    fn test_rejects_invalid_yaml() {
        let err = rewrite_citation("title: [unclosed\n", "1.0.2", DOI, "2024-06-30")
            .expect_err("invalid yaml");
        assert!(err.to_string().contains(DOCUMENT));
    }
}
