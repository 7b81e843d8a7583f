//! Troubleshooting engine
//!
//! The orchestrator the host's plugin hooks drive: once before all
//! installations to kick off the background rule sync, and once per
//! finished install to rewrite the error text of failures the catalog
//! can explain. Failures the catalog cannot explain pass through
//! untouched, except that native-extension build failures get a generic
//! guidance block appended.

pub mod hooks;
pub mod record;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog;
use crate::format::{ErrorFormatter, NATIVE_EXTENSION_PHRASE};
use crate::locale;
use crate::sync::SyncCache;

use self::hooks::HookRegistry;
use self::record::{FailureRecord, InstallState};

/// Filesystem layout for rules and sync state.
#[derive(Debug, Clone)]
pub struct TriagePaths {
    /// Directory of per-package rule files.
    pub handlers_dir: PathBuf,
    /// Last-sync marker file.
    pub marker_path: PathBuf,
}

impl TriagePaths {
    /// Resolve under the platform data directory.
    pub fn resolve() -> Result<Self> {
        let data_dir = directories::ProjectDirs::from("dev", "install-triage", "install-triage")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .or_else(|| dirs::data_dir().map(|d| d.join("install-triage")))
            .context("Could not determine data directory")?;

        Ok(Self::under(data_dir))
    }

    /// Lay out rules and sync state under one root directory.
    pub fn under(root: PathBuf) -> Self {
        Self {
            handlers_dir: root.join("handlers"),
            marker_path: root.join("last_sync"),
        }
    }
}

/// Matches failed installs against the rule catalog and rewrites their
/// error text.
pub struct TroubleshootEngine {
    handlers_dir: PathBuf,
    formatter: ErrorFormatter,
}

impl TroubleshootEngine {
    /// An engine reading rules from `handlers_dir`, styling for the
    /// detected terminal.
    pub fn new(handlers_dir: PathBuf) -> Self {
        Self {
            handlers_dir,
            formatter: ErrorFormatter::new(),
        }
    }

    /// An engine with an explicit formatter.
    pub fn with_formatter(handlers_dir: PathBuf, formatter: ErrorFormatter) -> Self {
        Self {
            handlers_dir,
            formatter,
        }
    }

    /// Subscribe the engine to the host's hooks.
    ///
    /// Registers one before-install-all callback (fires the rule sync)
    /// and one after-install callback (troubleshoots non-installed
    /// outcomes). Idempotent process-wide: the first call registers,
    /// every later call is a no-op returning false.
    pub fn register(
        engine: &Arc<Self>,
        sync: &Arc<SyncCache>,
        host: &mut dyn HookRegistry,
    ) -> bool {
        if !hooks::claim_registration() {
            debug!("Hooks already registered, skipping");
            return false;
        }

        let sync = Arc::clone(sync);
        host.add_before_install_all(Box::new(move || {
            let sync = Arc::clone(&sync);
            // The sync is fire-and-forget: on an async host it runs in
            // the background, elsewhere it completes inline.
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move { sync.refresh().await });
                }
                Err(_) => match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(sync.refresh()),
                    Err(err) => warn!("Could not start runtime for rule sync: {err}"),
                },
            }
        }));

        let engine = Arc::clone(engine);
        host.add_after_install(Box::new(move |spec_install| {
            if spec_install.state() != InstallState::Installed {
                engine.troubleshoot(spec_install);
            }
        }));

        true
    }

    /// Attempt to replace the raw failure output with a curated message.
    ///
    /// All rules are evaluated against the original error text in file
    /// order and the last matching rule wins. Configuration errors in
    /// the package's rule file disable troubleshooting for it; they
    /// never disturb the pipeline.
    pub fn troubleshoot(&self, record: &mut FailureRecord) {
        let rules = match catalog::load_rules(&self.handlers_dir, record.name()) {
            Ok(Some(rules)) => rules,
            Ok(None) => {
                self.apply_native_fallback(record);
                return;
            }
            Err(err) => {
                warn!("Skipping troubleshooting for {}: {err:#}", record.name());
                return;
            }
        };

        let version = match catalog::parse_lenient(record.version()) {
            Ok(version) => version,
            Err(err) => {
                warn!("Unparsable version for {}: {err:#}", record.name());
                return;
            }
        };

        let selected = rules
            .iter()
            .filter(|rule| rule.versions.matches(&version) && rule.matches_error(record.error()))
            .last();

        match selected {
            Some(rule) => {
                let message = locale::select(rule.messages());
                let rewritten = self.formatter.build(record, message);
                record.set_error(rewritten);
            }
            None => self.apply_native_fallback(record),
        }
    }

    /// Append generic guidance when the raw error points at a failed
    /// native-extension build and no rule had anything better.
    fn apply_native_fallback(&self, record: &mut FailureRecord) {
        if record.error().contains(NATIVE_EXTENSION_PHRASE) {
            let annotated = self.formatter.append_native_guidance(record.error());
            record.set_error(annotated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::StyleSheet;
    use crate::sync::DEFAULT_REMOTE_URL;
    use super::hooks::{AfterInstall, BeforeInstallAll};
    use serial_test::serial;
    use tempfile::TempDir;

    /// Minimal in-process host for registration tests.
    #[derive(Default)]
    struct MockHost {
        before_all: Vec<BeforeInstallAll>,
        after_install: Vec<AfterInstall>,
    }

    impl HookRegistry for MockHost {
        fn add_before_install_all(&mut self, hook: BeforeInstallAll) {
            self.before_all.push(hook);
        }

        fn add_after_install(&mut self, hook: AfterInstall) {
            self.after_install.push(hook);
        }
    }

    fn engine_in(dir: &TempDir) -> Arc<TroubleshootEngine> {
        Arc::new(TroubleshootEngine::with_formatter(
            dir.path().to_path_buf(),
            ErrorFormatter::with_styles(StyleSheet::plain()),
        ))
    }

    fn sync_in(dir: &TempDir) -> Arc<SyncCache> {
        Arc::new(
            SyncCache::new(
                DEFAULT_REMOTE_URL,
                dir.path().join("handlers"),
                dir.path().join("last_sync"),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_paths_layout_under_root() {
        let dir = TempDir::new().unwrap();
        let paths = TriagePaths::under(dir.path().to_path_buf());
        assert_eq!(paths.handlers_dir, dir.path().join("handlers"));
        assert_eq!(paths.marker_path, dir.path().join("last_sync"));
    }

    #[test]
    #[serial]
    fn test_registration_is_idempotent() {
        hooks::reset_registration();

        let dir = TempDir::new().unwrap();
        let engine = engine_in(&dir);
        let sync = sync_in(&dir);
        let mut host = MockHost::default();

        assert!(TroubleshootEngine::register(&engine, &sync, &mut host));
        assert!(!TroubleshootEngine::register(&engine, &sync, &mut host));

        // One callback each, so a failed install is troubleshot once
        assert_eq!(host.before_all.len(), 1);
        assert_eq!(host.after_install.len(), 1);
    }

    #[test]
    #[serial]
    fn test_after_install_hook_skips_successful_installs() {
        hooks::reset_registration();

        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("demo.yml"),
            "- versions: all\n  matching:\n    - boom\n  messages:\n    en: Curated.\n",
        )
        .unwrap();

        let engine = engine_in(&dir);
        let sync = sync_in(&dir);
        let mut host = MockHost::default();
        assert!(TroubleshootEngine::register(&engine, &sync, &mut host));

        let hook = &host.after_install[0];

        let mut ok = FailureRecord::new("demo", "1.0.0", "boom", InstallState::Installed);
        hook(&mut ok);
        assert_eq!(ok.error(), "boom");

        let mut failed = FailureRecord::new("demo", "1.0.0", "boom", InstallState::Failed);
        hook(&mut failed);
        assert!(failed.error().contains("Curated."));
    }
}
