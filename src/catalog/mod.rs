//! Troubleshooting rule catalog
//!
//! The catalog is a directory of per-package YAML rule files. Each rule
//! pairs a version range and a set of error-text signatures with
//! localized, human-actionable messages.
//!
//! # Architecture
//!
//! ```text
//! Remote catalog (static hosting)
//!     │
//!     ├── index                  ← path,timestamp per rule file
//!     └── handlers/<package>.yml ← the rule files themselves
//!            │
//!            ▼ (background sync, see crate::sync)
//!     local handlers dir
//!            │
//!            ▼ (loaded fresh per failing package)
//!     Vec<Rule>
//! ```
//!
//! Rules are loaded fresh on every troubleshooting call rather than
//! cached across invocations, so a background sync that just updated a
//! file is picked up immediately.

mod rules;
mod version;

pub use rules::{load_rules, Rule};
pub use version::{parse_lenient, VersionRange};
