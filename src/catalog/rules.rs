//! Rule file loading and validation
//!
//! Each package with known failure modes has one YAML file named
//! `<package>.yml`, holding a sequence of rules. Every rule has three
//! keys: `versions` (applicability range), `matching` (regex signatures
//! run against the raw error output), and `messages` (locale → curated
//! explanation). File order is preserved because it decides which rule
//! wins when several match.

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::version::{RawVersions, VersionRange};

/// A rule entry as it appears on disk, before validation.
#[derive(Debug, Deserialize)]
struct RawRule {
    versions: RawVersions,
    matching: Vec<String>,
    messages: HashMap<String, String>,
}

/// One troubleshooting rule, validated and with its signatures compiled.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Versions of the package this rule applies to.
    pub versions: VersionRange,
    signatures: Vec<Regex>,
    messages: HashMap<String, String>,
}

impl Rule {
    fn from_raw(raw: RawRule) -> Result<Self> {
        let versions = raw.versions.validate()?;

        if raw.matching.is_empty() {
            bail!("`matching` must list at least one signature");
        }
        if !raw.messages.contains_key("en") {
            bail!("`messages` must contain an \"en\" entry");
        }

        let signatures = raw
            .matching
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .with_context(|| format!("invalid signature pattern: \"{pattern}\""))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            versions,
            signatures,
            messages: raw.messages,
        })
    }

    /// True when any signature matches somewhere in the error text.
    ///
    /// Signatures are unanchored: a match anywhere in the output counts.
    pub fn matches_error(&self, error: &str) -> bool {
        self.signatures.iter().any(|re| re.is_match(error))
    }

    /// The signature patterns, as written in the rule file.
    pub fn signature_patterns(&self) -> impl Iterator<Item = &str> {
        self.signatures.iter().map(Regex::as_str)
    }

    /// The locale → message map. Always contains an `"en"` entry.
    pub fn messages(&self) -> &HashMap<String, String> {
        &self.messages
    }
}

/// Load the troubleshooting rules for one package.
///
/// Returns `Ok(None)` when no rule file exists for the package; having
/// nothing to say about a failure is not an error. A file that exists
/// but fails to parse or validate is a configuration error carried in
/// the `Err`, with the file path in the context chain.
pub fn load_rules(handlers_dir: &Path, package: &str) -> Result<Option<Vec<Rule>>> {
    let path = handlers_dir.join(format!("{package}.yml"));
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read rule file: {}", path.display()))?;

    let raw: Vec<RawRule> = serde_yaml_ng::from_str(&content)
        .with_context(|| format!("Failed to parse rule file: {}", path.display()))?;

    let rules = raw
        .into_iter()
        .map(Rule::from_raw)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Invalid rule file: {}", path.display()))?;

    debug!("Loaded {} rules for {package}", rules.len());
    Ok(Some(rules))
}
