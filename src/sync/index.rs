//! Remote catalog index
//!
//! Plain text, one line per rule file:
//!
//! ```text
//! handlers/nokogiri.yml,2024-11-02T09:14:00Z
//! handlers/pg.yml,2024-10-30T17:05:21Z
//! ```
//!
//! The timestamp is the remote file's last modification in UTC; it is
//! compared against the local file's mtime to decide what to download.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

/// One remote rule file and when it last changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Path of the rule file, relative to the catalog root.
    pub path: String,
    /// Remote last-modified time.
    pub updated_at: DateTime<Utc>,
}

/// Parse the remote index body.
///
/// Blank lines are skipped; any malformed line fails the whole index,
/// since a truncated or mangled download should abort the sync rather
/// than apply half of it.
pub fn parse(body: &str) -> Result<Vec<IndexEntry>> {
    let mut entries = Vec::new();

    for (number, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (path, stamp) = line.rsplit_once(',').with_context(|| {
            format!("index line {} is not `path,timestamp`: {line}", number + 1)
        })?;

        let updated_at = stamp
            .trim()
            .parse::<DateTime<Utc>>()
            .with_context(|| format!("index line {} has an invalid timestamp: {stamp}", number + 1))?;

        let path = path.trim();
        if path.is_empty() || path.split('/').any(|part| part == "..") {
            bail!("index line {} has an unusable path: {line}", number + 1);
        }

        entries.push(IndexEntry {
            path: path.to_string(),
            updated_at,
        });
    }

    Ok(entries)
}
