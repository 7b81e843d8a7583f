//! Host hook subscription
//!
//! The host package manager exposes two plugin hooks: one fired before
//! any installation begins, one fired after each install attempt. The
//! engine subscribes exactly once per process; re-registration is a
//! no-op so a plugin loaded twice cannot double-rewrite errors.
//!
//! Hosts that predate the after-install hook are covered by
//! [`LegacyInstallAdapter`], which wraps the host's install step and
//! emits the event itself.

use std::sync::atomic::{AtomicBool, Ordering};

use semver::Version;

use super::record::FailureRecord;

/// Callback invoked once before any installation begins.
pub type BeforeInstallAll = Box<dyn Fn() + Send + Sync>;

/// Callback invoked after each package install attempt.
pub type AfterInstall = Box<dyn Fn(&mut FailureRecord) + Send + Sync>;

/// The host's hook registration surface.
///
/// Implemented by the host (or by an adapter over its plugin API); the
/// engine only ever adds callbacks through it.
pub trait HookRegistry {
    /// Register a callback fired before all installations begin.
    fn add_before_install_all(&mut self, hook: BeforeInstallAll);

    /// Register a callback fired after each install attempt.
    fn add_after_install(&mut self, hook: AfterInstall);
}

/// Process-wide registration guard.
static REGISTERED: AtomicBool = AtomicBool::new(false);

/// Claim the one registration slot for this process.
///
/// Returns false when registration already happened.
pub(crate) fn claim_registration() -> bool {
    REGISTERED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
}

#[cfg(test)]
pub(crate) fn reset_registration() {
    REGISTERED.store(false, Ordering::SeqCst);
}

/// First host version that ships the after-install hook natively.
///
/// Older hosts need [`LegacyInstallAdapter`].
pub fn supports_after_install(host_version: &Version) -> bool {
    *host_version >= Version::new(1, 17, 0)
}

/// Wraps a host install step on hosts without an after-install hook.
///
/// The wrapped step runs unchanged; the adapter then emits the
/// after-install event with the step's record. The host calls
/// [`install`](Self::install) wherever it would have called the step
/// directly.
pub struct LegacyInstallAdapter<S> {
    step: S,
    after: AfterInstall,
}

impl<S> LegacyInstallAdapter<S>
where
    S: FnMut(&mut FailureRecord),
{
    /// Wrap `step`, emitting `after` once per install attempt.
    pub fn new(step: S, after: AfterInstall) -> Self {
        Self { step, after }
    }

    /// Run one install step, then emit the after-install event.
    pub fn install(&mut self, record: &mut FailureRecord) {
        (self.step)(record);
        (self.after)(record);
    }
}
