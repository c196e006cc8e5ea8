//! Per-record salvage for documents that do not parse as a whole.
//!
//! Model output is most often unparseable because it was cut off near the
//! token limit. Each [`RecordSalvager`] pulls complete records out of such a
//! text on its own terms; a malformed record is skipped, never fatal.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value, json};

use super::extract::matching_brace;

/// Strategy interface for partial extraction.
///
/// Returns a partial document holding whatever could be recovered, or `None`
/// when nothing usable was found. Stricter parsers can replace the regex
/// salvagers without touching the pipeline.
pub trait RecordSalvager: Send + Sync {
    fn name(&self) -> &'static str;

    fn salvage(&self, text: &str) -> Option<Map<String, Value>>;
}

/// Decode the body of a JSON string literal (without the quotes).
fn decode_json_string(raw: &str) -> Option<String> {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).ok()
}

static FILE_PATH_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\s*"path"\s*:\s*"((?:[^"\\]|\\.)+)"\s*,\s*"content"\s*:\s*"((?:[^"\\]|\\.)*)"\s*\}"#)
        .unwrap()
});

static FILE_CONTENT_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\s*"content"\s*:\s*"((?:[^"\\]|\\.)*)"\s*,\s*"path"\s*:\s*"((?:[^"\\]|\\.)+)"\s*\}"#)
        .unwrap()
});

static FILES_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""files"\s*:\s*\["#).unwrap());

/// Salvages file records from a damaged project document.
///
/// Two sources are merged by position: exact `{"path", "content"}` pairs
/// in either key order found anywhere in the text, and complete objects
/// with a string `path` inside the `files` array (which keeps records that
/// carry extra keys). Records are returned under `files` in first-seen
/// order, de-duplicated by path.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileRecordSalvager;

impl FileRecordSalvager {
    fn pairs(text: &str) -> Vec<(usize, Value)> {
        // (offset, raw path, raw content)
        let mut raw: Vec<(usize, &str, &str)> = Vec::new();
        for caps in FILE_PATH_FIRST_RE.captures_iter(text) {
            let (Some(whole), Some(path), Some(content)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            raw.push((whole.start(), path.as_str(), content.as_str()));
        }
        for caps in FILE_CONTENT_FIRST_RE.captures_iter(text) {
            let (Some(whole), Some(content), Some(path)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            raw.push((whole.start(), path.as_str(), content.as_str()));
        }

        raw.into_iter()
            .filter_map(|(offset, raw_path, raw_content)| {
                match (decode_json_string(raw_path), decode_json_string(raw_content)) {
                    (Some(path), Some(content)) => {
                        Some((offset, json!({ "path": path, "content": content })))
                    }
                    _ => {
                        tracing::debug!("skipping file record with undecodable escapes");
                        None
                    }
                }
            })
            .collect()
    }

    fn array_records(text: &str) -> Vec<(usize, Value)> {
        let Some(start) = FILES_ARRAY_RE.find(text).map(|m| m.end()) else {
            return Vec::new();
        };
        scan_object_spans(&text[start..])
            .into_iter()
            .filter_map(|(offset, fragment)| match serde_json::from_str::<Value>(fragment) {
                Ok(value) if value.get("path").is_some_and(Value::is_string) => {
                    Some((start + offset, value))
                }
                _ => None,
            })
            .collect()
    }
}

impl RecordSalvager for FileRecordSalvager {
    fn name(&self) -> &'static str {
        "file-records"
    }

    fn salvage(&self, text: &str) -> Option<Map<String, Value>> {
        // Array records first so a full object wins over the pair found at
        // the same offset.
        let mut found = Self::array_records(text);
        found.extend(Self::pairs(text));
        found.sort_by_key(|(offset, _)| *offset);

        let mut seen = HashSet::new();
        let files: Vec<Value> = found
            .into_iter()
            .filter(|(_, record)| {
                record
                    .get("path")
                    .and_then(Value::as_str)
                    .is_some_and(|path| seen.insert(path.to_string()))
            })
            .map(|(_, record)| record)
            .collect();

        if files.is_empty() {
            return None;
        }
        let mut doc = Map::new();
        doc.insert("files".to_string(), Value::Array(files));
        Some(doc)
    }
}

/// Salvages complete objects from the array under `key`, even when the
/// array or the surrounding document is truncated.
#[derive(Debug, Clone)]
pub struct ArrayRecordSalvager {
    key: &'static str,
    opener: Regex,
}

impl ArrayRecordSalvager {
    pub fn new(key: &'static str) -> Self {
        let opener = Regex::new(&format!(r#""{}"\s*:\s*\["#, regex::escape(key)))
            .expect("escaped key forms a valid pattern");
        Self { key, opener }
    }
}

impl RecordSalvager for ArrayRecordSalvager {
    fn name(&self) -> &'static str {
        "array-records"
    }

    fn salvage(&self, text: &str) -> Option<Map<String, Value>> {
        let start = self.opener.find(text)?.end();
        let records: Vec<Value> = scan_objects(&text[start..])
            .into_iter()
            .filter_map(|fragment| match serde_json::from_str::<Value>(fragment) {
                Ok(value @ Value::Object(_)) => Some(value),
                _ => {
                    tracing::debug!(key = self.key, "skipping malformed record fragment");
                    None
                }
            })
            .collect();

        if records.is_empty() {
            return None;
        }
        let mut doc = Map::new();
        doc.insert(self.key.to_string(), Value::Array(records));
        Some(doc)
    }
}

/// Split the inside of a JSON array into balanced top-level `{...}` slices.
///
/// Stops at the closing `]` or at the first object that never closes.
/// String literals (and escapes inside them) are honoured so braces in
/// values do not unbalance the scan.
pub fn scan_objects(text: &str) -> Vec<&str> {
    scan_object_spans(text)
        .into_iter()
        .map(|(_, fragment)| fragment)
        .collect()
}

/// [`scan_objects`] with the byte offset of each slice.
fn scan_object_spans(text: &str) -> Vec<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut fragments = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b']' => break,
            b'{' => match matching_brace(bytes, i) {
                Some(end) => {
                    fragments.push((i, &text[i..=end]));
                    i = end + 1;
                }
                None => break,
            },
            _ => i += 1,
        }
    }

    fragments
}

/// Salvages complete top-level string fields for a fixed set of keys.
#[derive(Debug, Clone)]
pub struct StringFieldSalvager {
    pattern: Regex,
}

impl StringFieldSalvager {
    pub fn new(keys: &[&str]) -> Self {
        let alternatives: Vec<String> = keys.iter().map(|k| regex::escape(k)).collect();
        let pattern = Regex::new(&format!(
            r#""({})"\s*:\s*"((?:[^"\\]|\\.)*)""#,
            alternatives.join("|")
        ))
        .expect("escaped keys form a valid pattern");
        Self { pattern }
    }
}

impl RecordSalvager for StringFieldSalvager {
    fn name(&self) -> &'static str {
        "string-fields"
    }

    fn salvage(&self, text: &str) -> Option<Map<String, Value>> {
        let mut doc = Map::new();
        for caps in self.pattern.captures_iter(text) {
            let (Some(key), Some(raw)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if doc.contains_key(key.as_str()) {
                continue;
            }
            if let Some(value) = decode_json_string(raw.as_str()) {
                doc.insert(key.as_str().to_string(), Value::String(value));
            }
        }
        (!doc.is_empty()).then_some(doc)
    }
}
