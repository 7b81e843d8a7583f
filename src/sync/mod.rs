//! Background rule synchronization
//!
//! Once per pipeline run, before any installation starts, the local
//! rule files are refreshed from a remote catalog. The refresh is best
//! effort and fire-and-forget: every failure is logged and swallowed so
//! the pipeline never waits on, or fails because of, the catalog.
//!
//! Sequencing matters: the sync marker is written *before* the network
//! fetch, inside a process-wide lock, so concurrent pipelines cannot
//! both start a sync and a failed sync is not retried until the next
//! expiry window.

mod index;
mod marker;

pub use index::IndexEntry;
pub use marker::SyncMarker;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Guards the expiry check and marker write as one step.
static SYNC_GUARD: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// HTTP request timeout for index and rule-file fetches.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default remote catalog root.
pub const DEFAULT_REMOTE_URL: &str = "https://rules.install-triage.dev";

/// Remote catalog synchronizer.
pub struct SyncCache {
    base_url: String,
    handlers_dir: PathBuf,
    marker: SyncMarker,
    client: reqwest::Client,
}

impl SyncCache {
    /// A synchronizer for one catalog root and local layout.
    pub fn new(base_url: &str, handlers_dir: PathBuf, marker_path: PathBuf) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("install-triage/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            handlers_dir,
            marker: SyncMarker::new(marker_path),
            client,
        })
    }

    /// Refresh local rule files if the cache has expired.
    ///
    /// Never fails and never panics: network and format problems are
    /// logged, written to a detail file next to the marker, and
    /// swallowed. Files updated before a failure stay in place.
    pub async fn refresh(&self) {
        {
            let _guard = SYNC_GUARD.lock().unwrap_or_else(|poison| poison.into_inner());

            if !self.marker.is_expired() {
                debug!("Rule sync skipped: cache is fresh");
                return;
            }

            // Mark before fetching, so a retry storm cannot start a
            // second sync even if this one fails below.
            if let Err(err) = self.marker.touch() {
                warn!("Could not write sync marker, syncing anyway: {err:#}");
            }
        }

        if let Err(err) = self.sync_files().await {
            self.report_failure(&err);
        }
    }

    async fn sync_files(&self) -> Result<()> {
        let body = self.fetch_text("index").await?;
        let entries = index::parse(&body)?;

        println!("Syncing troubleshooting rules from {}", self.base_url);

        for entry in entries {
            if !self.needs_update(&entry) {
                debug!("{} is up to date", entry.path);
                continue;
            }

            let content = self.fetch_text(&entry.path).await?;
            let dest = self.handlers_dir.join(&entry.path);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&dest, content)
                .with_context(|| format!("Failed to write {}", dest.display()))?;

            println!("  updated {}", entry.path);
        }

        Ok(())
    }

    /// A rule file needs downloading when it is missing locally or its
    /// mtime is older than the remote timestamp.
    fn needs_update(&self, entry: &IndexEntry) -> bool {
        let path = self.handlers_dir.join(&entry.path);
        let Ok(meta) = std::fs::metadata(&path) else {
            return true;
        };
        let Ok(modified) = meta.modified() else {
            return true;
        };
        DateTime::<Utc>::from(modified) < entry.updated_at
    }

    async fn fetch_text(&self, file: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, file);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        if !response.status().is_success() {
            bail!("Fetch failed: HTTP {} from {}", response.status(), url);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))
    }

    /// Persist diagnostic detail next to the marker and move on.
    fn report_failure(&self, err: &anyhow::Error) {
        warn!("Rule sync failed: {err:#}");

        let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
        let detail_path = self
            .marker
            .path()
            .parent()
            .map(|dir| dir.join(format!("sync-failure-{stamp}.log")))
            .unwrap_or_else(|| PathBuf::from(format!("sync-failure-{stamp}.log")));

        let detail = format!(
            "rule sync from {} failed at {}\n\n{err:?}\n",
            self.base_url,
            Utc::now().to_rfc3339()
        );

        match std::fs::write(&detail_path, detail) {
            Ok(()) => println!("Rule sync failed; details saved to {}", detail_path.display()),
            Err(write_err) => warn!("Could not write sync failure detail: {write_err}"),
        }
    }
}
