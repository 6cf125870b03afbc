//! Fenced ```json block scanning.

use std::sync::OnceLock;

use regex::Regex;

/// Matches one fenced block tagged `json` (case-insensitive), capturing the
/// content between the markers. `(?s)` lets `.` span newlines; lazy `.*?`
/// stops at the nearest closing fence so consecutive blocks stay separate.
fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("fence regex is valid")
    })
}

/// Content of the last (rightmost) fenced `json` block, if any.
///
/// Streamed text is append-only, so earlier blocks are typically incomplete
/// prefixes of the spec still being written — only the last one counts. An
/// opening fence with no closing marker yet is not a block.
pub(super) fn last_fenced_json_block(text: &str) -> Option<&str> {
    fence_re()
        .captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
