//! Rendering of the replacement error block
//!
//! A matched rule's message is framed with a bold title, a separator of
//! matching width, and a red sidebar down the left edge. If the original
//! error pointed at a build log, that pointer is kept at the bottom of
//! the block so nothing the host wrote is lost.

mod style;

pub use style::StyleSheet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::record::FailureRecord;

/// Pulls the log-file pointer the host appends to build failures.
static RESULTS_LOGGED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Results logged to (?P<path>.*)").expect("literal pattern compiles")
});

/// Sidebar marker prefixed to every rendered line.
const SIDEBAR: &str = "{{red:┃}}";

/// Phrase identifying a native-extension build failure in raw output.
pub const NATIVE_EXTENSION_PHRASE: &str = "Failed to build gem native extension";

/// Generic guidance appended when a native-extension build fails and no
/// rule had anything more specific to say.
const NATIVE_EXTENSION_GUIDANCE: &str = "\
{{bold:This package failed to compile its native extension.}}
Common fixes:
- Make sure a C/C++ toolchain is installed (gcc, clang, or build-essential).
- Install the development headers the extension links against.
- Re-run the install and read the compiler output above for the first error.";

/// Renders replacement error blocks for one output device.
#[derive(Debug, Clone, Copy)]
pub struct ErrorFormatter {
    styles: StyleSheet,
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorFormatter {
    /// Formatter for the detected capability of standard output.
    pub fn new() -> Self {
        Self {
            styles: StyleSheet::detect(),
        }
    }

    /// Formatter with an explicit style sheet.
    pub fn with_styles(styles: StyleSheet) -> Self {
        Self { styles }
    }

    /// Render the full replacement block for a matched rule.
    ///
    /// `record.error()` must still hold the original failure output;
    /// the log-file pointer is extracted from it before any rewrite.
    pub fn build(&self, record: &FailureRecord, message: &str) -> String {
        let mut body = message.to_string();
        if let Some(caps) = RESULTS_LOGGED.captures(record.error()) {
            body.push_str("\n{{bold:Original Logs are available at:}}\n");
            body.push_str(caps.name("path").map_or("", |m| m.as_str()));
        }

        let title = format!(
            "{} ({}) could not be installed",
            record.name(),
            record.version()
        );

        let mut lines = vec![
            format!("{{{{bold:{title}}}}}"),
            "━".repeat(title.chars().count()),
        ];
        lines.extend(body.lines().map(str::to_string));

        let block = lines
            .iter()
            .map(|line| format!("{SIDEBAR} {line}").trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n");

        self.styles.resolve(&block)
    }

    /// Append the generic native-extension guidance to an unmatched
    /// error, keeping the original output intact.
    pub fn append_native_guidance(&self, original: &str) -> String {
        let annotated = format!("{original}\n\n{NATIVE_EXTENSION_GUIDANCE}");
        self.styles.resolve(&annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::record::InstallState;
    use pretty_assertions::assert_eq;

    fn record(error: &str) -> FailureRecord {
        FailureRecord::new("testing_stuff", "1.5", error, InstallState::Failed)
    }

    #[test]
    fn test_block_layout() {
        let formatter = ErrorFormatter::with_styles(StyleSheet::plain());
        let block = formatter.build(&record("testing stuff only"), "This is a message");

        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "┃ testing_stuff (1.5) could not be installed");

        let title = "testing_stuff (1.5) could not be installed";
        assert_eq!(lines[1], format!("┃ {}", "━".repeat(title.chars().count())));
        assert_eq!(lines[2], "┃ This is a message");
    }

    #[test]
    fn test_log_pointer_is_carried_over() {
        let formatter = ErrorFormatter::with_styles(StyleSheet::plain());
        let block = formatter.build(
            &record("compile failed\nResults logged to /tmp/build.log"),
            "Install the headers.",
        );

        assert!(block.contains("Original Logs are available at:"));
        assert!(block.contains("/tmp/build.log"));
    }

    #[test]
    fn test_empty_body_lines_keep_bare_sidebar() {
        let formatter = ErrorFormatter::with_styles(StyleSheet::plain());
        let block = formatter.build(&record("boom"), "first\n\nsecond");

        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[3], "┃");
        assert_eq!(lines[4], "┃ second");
    }

    #[test]
    fn test_native_guidance_appends_not_replaces() {
        let formatter = ErrorFormatter::with_styles(StyleSheet::plain());
        let original = format!("log tail\n{NATIVE_EXTENSION_PHRASE}\nmore");
        let annotated = formatter.append_native_guidance(&original);

        assert!(annotated.starts_with(&original));
        assert!(annotated.contains("failed to compile its native extension"));
    }
}
