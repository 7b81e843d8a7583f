//! Locale-aware message selection
//!
//! Rule messages are keyed by bare language code. The active language is
//! taken from the `LANG` environment variable, assumed to follow the
//! POSIX `lang_REGION.encoding` convention; only the part before the
//! first underscore is used. English is the fallback for everything
//! else, and catalog validation guarantees it is present.

use std::collections::HashMap;

/// Environment variable consulted for the active locale.
const LANG_VAR: &str = "LANG";

/// Select the best-fit message body for the active locale.
///
/// Reads `LANG` on every call; the host process may change it between
/// installations.
pub fn select(messages: &HashMap<String, String>) -> &str {
    let lang = std::env::var(LANG_VAR).unwrap_or_else(|_| "en".to_string());
    select_for(messages, &lang)
}

/// Locale lookup against an explicit `LANG`-style identifier.
pub fn select_for<'a>(messages: &'a HashMap<String, String>, lang: &str) -> &'a str {
    let code = lang.split('_').next().unwrap_or("en");
    messages
        .get(code)
        .or_else(|| messages.get("en"))
        .map_or("", String::as_str)
}
