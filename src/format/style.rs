//! Inline style directives
//!
//! Curated messages and the rendered error block carry markup of the
//! form `{{style:text}}`. On a capable terminal each directive resolves
//! to the matching ANSI SGR sequence; otherwise the markup is stripped
//! and the text passes through unchanged. Directives nest, and closing a
//! nested directive restores the styles still open around it.

use std::io::IsTerminal;

/// Map a directive name to its SGR parameter.
fn sgr_code(name: &str) -> Option<&'static str> {
    match name {
        "bold" => Some("1"),
        "italic" => Some("3"),
        "underline" => Some("4"),
        "red" => Some("31"),
        "green" => Some("32"),
        "yellow" => Some("33"),
        "blue" => Some("34"),
        "magenta" => Some("35"),
        "cyan" => Some("36"),
        _ => None,
    }
}

/// Resolves `{{style:text}}` directives for one output device.
#[derive(Debug, Clone, Copy)]
pub struct StyleSheet {
    colored: bool,
}

impl StyleSheet {
    /// Detect the capability of standard output.
    ///
    /// Styling is enabled only for a terminal, and `NO_COLOR` always
    /// wins.
    pub fn detect() -> Self {
        let colored = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self { colored }
    }

    /// A sheet that strips all directives.
    pub fn plain() -> Self {
        Self { colored: false }
    }

    /// A sheet that always emits ANSI sequences.
    pub fn ansi() -> Self {
        Self { colored: true }
    }

    /// Resolve every directive in `input`.
    ///
    /// Unknown style names are stripped without styling their text.
    /// Unpaired `}}` outside any directive is left as literal text.
    pub fn resolve(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        // SGR codes currently open, "" for unknown styles
        let mut open: Vec<&'static str> = Vec::new();
        let mut rest = input;

        while !rest.is_empty() {
            if let Some((name, after)) = parse_open(rest) {
                let code = sgr_code(name).unwrap_or("");
                if self.colored && !code.is_empty() {
                    out.push_str(&format!("\x1b[{code}m"));
                }
                open.push(code);
                rest = after;
                continue;
            }

            if let Some(after) = rest.strip_prefix("}}") {
                if let Some(closed) = open.pop() {
                    if self.colored && !closed.is_empty() {
                        // Reset, then restore everything still open
                        out.push_str("\x1b[0m");
                        for code in open.iter().filter(|c| !c.is_empty()) {
                            out.push_str(&format!("\x1b[{code}m"));
                        }
                    }
                    rest = after;
                    continue;
                }
            }

            let ch = rest.chars().next().unwrap_or('\u{fffd}');
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }

        out
    }
}

/// Try to read a `{{name:` opener; returns the name and the remainder.
fn parse_open(s: &str) -> Option<(&str, &str)> {
    let body = s.strip_prefix("{{")?;
    let colon = body.find(':')?;
    let name = &body[..colon];
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some((name, &body[colon + 1..]))
}
