//! install-triage library exports
//!
//! A post-install diagnostic layer for package installation pipelines:
//! failed installs are matched against a catalog of known-failure rules
//! and their raw errors rewritten into curated, localized explanations.

pub mod catalog;
pub mod engine;
pub mod format;
pub mod locale;
pub mod sync;
