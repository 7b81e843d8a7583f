//! The host pipeline's per-package installation record

/// Outcome of one installation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    /// The package installed successfully.
    Installed,
    /// The installation failed.
    Failed,
    /// Any other terminal state the host reports.
    Other,
}

/// One package installation attempt, owned by the host pipeline.
///
/// The engine reads the identity fields and conditionally rewrites the
/// error text; it never changes the outcome itself.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    name: String,
    version: String,
    error: String,
    state: InstallState,
}

impl FailureRecord {
    /// Build a record from the host's installation result.
    ///
    /// `version` is kept verbatim for display; it is parsed leniently
    /// only when matched against a rule's version range.
    pub fn new(name: &str, version: &str, error: &str, state: InstallState) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            error: error.to_string(),
            state,
        }
    }

    /// Package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Installed version, exactly as the host reported it.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Current error text.
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Outcome of the attempt.
    pub fn state(&self) -> InstallState {
        self.state
    }

    /// Replace the error text shown to the user.
    pub fn set_error(&mut self, text: String) {
        self.error = text;
    }
}
