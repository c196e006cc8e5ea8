//! Whole-document extraction strategies: direct parse, fence strip, brace slice.

use serde_json::{Map, Value};
use std::sync::LazyLock;

use regex::Regex;

/// A line holding only a fence delimiter, with or without a language tag.
static FENCE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_+.-]*[ \t]*\r?$\n?").unwrap());

/// An opening fence glued to the payload on the same line (```json{...).
static LEADING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```(?:json5?|javascript|js)?\s*").unwrap());

/// Parse `text` as a JSON object. Any other JSON value is rejected.
pub fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Remove markdown fences and the prose around the first fenced block.
///
/// Only whole delimiter lines are matched, so backticks inside JSON string
/// values survive. Running it twice is a no-op.
pub fn strip_markdown(text: &str) -> String {
    fenced_blocks(text).into_iter().next().unwrap_or_default()
}

/// The body of every fenced block, in order.
///
/// Delimiter lines pair up open/close; an unterminated last block runs to
/// the end of the text. Text without any delimiter line is treated as one
/// block, so a fence glued to the payload (```json{...}```) still strips.
pub fn fenced_blocks(text: &str) -> Vec<String> {
    let delimiters: Vec<_> = FENCE_LINE_RE.find_iter(text).collect();
    if delimiters.is_empty() {
        return Some(clean_block(text))
            .filter(|body| !body.is_empty())
            .into_iter()
            .collect();
    }

    delimiters
        .chunks(2)
        .map(|pair| match pair {
            [open, close] => &text[open.end()..close.start()],
            [open] => &text[open.end()..],
            _ => "",
        })
        .map(clean_block)
        .filter(|body| !body.is_empty())
        .collect()
}

fn clean_block(body: &str) -> String {
    let trimmed = body.trim();
    let trimmed = LEADING_FENCE_RE.replace(trimmed, "");
    let trimmed = trimmed.trim();
    trimmed
        .strip_suffix("```")
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Slice from the first `{` to the last `}` inclusive.
pub fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Every balanced top-level `{...}` span in `text`, in order.
///
/// Stops at the first `{` that never closes, since everything after it
/// belongs to a truncated object.
pub fn balanced_objects(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while let Some(offset) = text[i..].find('{') {
        let open = i + offset;
        let Some(close) = matching_brace(bytes, open) else {
            break;
        };
        spans.push(&text[open..=close]);
        i = close + 1;
    }

    spans
}

/// Index of the `}` closing the `{` at `open`, if the text contains it.
///
/// String literals (and escapes inside them) are honoured so braces in
/// values do not unbalance the scan.
pub(crate) fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}
