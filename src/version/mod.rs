//! Release tag normalization.
//!
//! Release tags are written by humans (`v1.0.2`, `release-2.1`, `2024.03`).
//! Metadata files want a plain semantic version, so tags are cleaned when they
//! already are one, coerced when they contain one, and kept verbatim otherwise.

use regex::Regex;
use semver::Version;
use std::fmt;
use std::sync::LazyLock;

/// How a release tag was turned into the version written to metadata files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedTag {
    /// Tag was a valid semantic version (after stripping `v` / `=` / whitespace)
    Clean(Version),
    /// Tag contained a `major[.minor[.patch]]` run that was extracted
    Coerced(Version),
    /// Nothing version-like found; the literal tag is used
    Literal(String),
}

impl NormalizedTag {
    /// Parse a release tag
    pub fn parse(tag: &str) -> Self {
        if let Some(version) = clean(tag) {
            return NormalizedTag::Clean(version);
        }

        match coerce(tag) {
            Some(version) => NormalizedTag::Coerced(version),
            None => {
                log::warn!(
                    "The tag name {} is not a valid semver. Reverting to the original tag name.",
                    tag
                );
                NormalizedTag::Literal(tag.to_string())
            }
        }
    }
}

impl fmt::Display for NormalizedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedTag::Clean(v) | NormalizedTag::Coerced(v) => write!(f, "{}", v),
            NormalizedTag::Literal(tag) => write!(f, "{}", tag),
        }
    }
}

/// Strict parse after removing the decorations commonly found on tags
fn clean(tag: &str) -> Option<Version> {
    let trimmed = tag.trim().trim_start_matches('=').trim_start_matches(['v', 'V']).trim();
    Version::parse(trimmed).ok()
}

/// First `major[.minor[.patch]]` group in the tag, missing parts set to zero
fn coerce(tag: &str) -> Option<Version> {
    static COERCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(\d{1,16})(?:\.(\d{1,16}))?(?:\.(\d{1,16}))?")
            .expect("coercion regex is valid")
    });

    let caps = COERCE_RE.captures(tag)?;
    let part = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    Some(Version::new(part(1)?, part(2)?, part(3)?))
}
