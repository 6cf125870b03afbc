//! Balanced top-level `{...}` region scanning.

/// The last top-level balanced-brace region in `text`, by end offset.
///
/// A region is top-level when its opening brace takes the depth stack from
/// empty to non-empty and its matching closing brace returns it to empty.
/// Characters inside double-quoted string literals are transparent, so brace
/// characters in string values (template field references and the like)
/// never count as structural nesting. `\"` inside a string does not toggle
/// string mode.
///
/// Scanning is byte-wise: every delimiter is ASCII and no UTF-8 continuation
/// byte collides with one, so the returned offsets always sit on character
/// boundaries.
pub(super) fn last_balanced_object(text: &str) -> Option<&str> {
    let mut in_string = false;
    let mut escape = false;

    let mut stack: Vec<usize> = Vec::new();
    let mut last: Option<(usize, usize)> = None;

    for (i, b) in text.bytes().enumerate() {
        if escape {
            escape = false;
            continue;
        }
        match b {
            b'\\' => {
                if in_string {
                    escape = true;
                }
            }
            b'"' => in_string = !in_string,
            b'{' if !in_string => stack.push(i),
            b'}' if !in_string => {
                if let Some(start) = stack.pop() {
                    if stack.is_empty() {
                        last = Some((start, i + 1));
                    }
                }
            }
            _ => {}
        }
    }

    last.map(|(start, end)| &text[start..end])
}
