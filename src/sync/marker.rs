//! Last-sync marker file
//!
//! A single on-disk timestamp throttles catalog syncs. The marker is
//! written at the *start* of a sync, before any network traffic, so a
//! concurrent or crashed run cannot trigger a second sync inside the
//! expiry window.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};

/// How long a recorded sync check suppresses further syncs.
const EXPIRY_HOURS: i64 = 24;

/// The persisted last-sync timestamp.
#[derive(Debug, Clone)]
pub struct SyncMarker {
    path: PathBuf,
}

impl SyncMarker {
    /// A marker stored at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Where the marker lives on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the marker is missing, unreadable, unparsable, or
    /// older than the expiry window. Any doubt means expired.
    pub fn is_expired(&self) -> bool {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return true;
        };
        let Ok(stamp) = content.trim().parse::<DateTime<Utc>>() else {
            return true;
        };
        Utc::now() - stamp > Duration::hours(EXPIRY_HOURS)
    }

    /// Record the current time as the last sync check.
    pub fn touch(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create marker directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.path, Utc::now().to_rfc3339())
            .with_context(|| format!("Failed to write sync marker: {}", self.path.display()))
    }
}
