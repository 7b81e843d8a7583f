//! Version ranges for troubleshooting rules
//!
//! Rule files declare applicability either as the string `all` or as a
//! mapping with optional `min`/`max` bounds. The bounds carry asymmetric
//! semantics inherited from the existing rule corpus: a lone `min` is an
//! exclusive lower bound, while a `min`/`max` pair is inclusive on both
//! ends. Rule files depend on this, so it is preserved exactly.

use anyhow::{bail, Context, Result};
use semver::Version;
use serde::Deserialize;

/// Version applicability of a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRange {
    /// The rule applies to every version of the package.
    All,
    /// The rule applies to a bounded span of versions.
    Bounded {
        /// Lower bound. Exclusive when `max` is absent, inclusive otherwise.
        min: Version,
        /// Inclusive upper bound, if any.
        max: Option<Version>,
    },
}

impl VersionRange {
    /// Whether `candidate` falls inside this range.
    pub fn matches(&self, candidate: &Version) -> bool {
        match self {
            Self::All => true,
            Self::Bounded {
                min,
                max: Some(max),
            } => candidate >= min && candidate <= max,
            Self::Bounded { min, max: None } => candidate > min,
        }
    }
}

/// The `versions` key as it appears on disk, before validation.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawVersions {
    Keyword(String),
    Bounds {
        min: Option<String>,
        max: Option<String>,
    },
}

impl RawVersions {
    /// Validate the raw shape into a [`VersionRange`].
    ///
    /// Anything other than the keyword `all` or a `min`/`max` mapping is
    /// a configuration error. A missing `min` defaults to 0.
    pub(crate) fn validate(self) -> Result<VersionRange> {
        match self {
            Self::Keyword(word) if word == "all" => Ok(VersionRange::All),
            Self::Keyword(word) => {
                bail!("`versions` must be \"all\" or a mapping with min/max, got \"{word}\"")
            }
            Self::Bounds { min, max } => {
                let min = match min {
                    Some(raw) => parse_lenient(&raw).context("invalid `min` version")?,
                    None => Version::new(0, 0, 0),
                };
                let max = max
                    .map(|raw| parse_lenient(&raw).context("invalid `max` version"))
                    .transpose()?;
                Ok(VersionRange::Bounded { min, max })
            }
        }
    }
}

/// Parse a version string, padding missing components.
///
/// Installers and rule files routinely carry partial versions like
/// `1.5` or `2`, which strict semver rejects. Missing minor/patch
/// components are treated as zero; prerelease and build suffixes are
/// kept as written.
pub fn parse_lenient(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    if let Ok(version) = Version::parse(trimmed) {
        return Ok(version);
    }

    let split = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split);
    let padded = match core.chars().filter(|&c| c == '.').count() {
        0 => format!("{core}.0.0{suffix}"),
        1 => format!("{core}.0{suffix}"),
        _ => trimmed.to_string(),
    };

    Version::parse(&padded).with_context(|| format!("invalid version string: \"{input}\""))
}
