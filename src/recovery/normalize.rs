//! Post-recovery normalization: fill defaults and recompute rollups.
//!
//! Runs after whichever strategy produced the document. Individual records
//! that cannot be normalized are dropped; the document as a whole never is.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::models::architecture::{DEFAULT_SETUP_INSTRUCTIONS, Dependencies};
use crate::models::{DocKind, GeneratedFile, GeneratedProject, Issue, ReviewReport, Severity};

/// Non-empty string value of `key`, if any.
fn text_field<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn text_or(record: &Map<String, Value>, key: &str, default: &str) -> String {
    text_field(record, key).unwrap_or(default).to_string()
}

/// Ids may come back as numbers (`"id": 1`); keep them as text.
fn id_field(record: &Map<String, Value>, index: usize) -> String {
    match record.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("item-{}", index + 1),
    }
}

/// Positive line number from a number or numeric string, else 1.
fn line_field(record: &Map<String, Value>) -> u32 {
    let line = match record.get("line") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    line.filter(|&l| l > 0)
        .and_then(|l| u32::try_from(l).ok())
        .unwrap_or(1)
}

fn normalize_issue(record: &Map<String, Value>, index: usize) -> Issue {
    Issue {
        id: id_field(record, index),
        severity: text_field(record, "severity")
            .map(Severity::from_loose)
            .unwrap_or_default(),
        category: text_or(record, "category", "quality"),
        title: text_or(record, "title", "Code Issue"),
        file: text_or(record, "file", "unknown"),
        line: line_field(record),
        code_snippet: text_or(record, "code_snippet", ""),
        problem: text_or(record, "problem", "Issue detected"),
        impact: text_or(record, "impact", "May cause problems"),
        fix: text_or(record, "fix", "Review and fix"),
        explanation: text_or(record, "explanation", "See fix above"),
    }
}

/// Normalize a review document.
///
/// A missing or non-array `issues` becomes an empty list. Any summary the
/// model sent is ignored; [`ReviewReport::new`] derives it from the records.
pub fn normalize_issues(document: &Map<String, Value>) -> ReviewReport {
    let records = document
        .get("issues")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let issues: Vec<Issue> = records
        .iter()
        .filter_map(Value::as_object)
        .enumerate()
        .map(|(index, record)| normalize_issue(record, index))
        .collect();

    ReviewReport::new(issues)
}

/// Place a generated path under `frontend/` or `backend/`.
pub fn prefix_path(path: &str) -> String {
    let path = path.trim_start_matches("./");
    if path.starts_with("frontend/") || path.starts_with("backend/") {
        path.to_string()
    } else if path.contains("server") {
        format!("backend/{path}")
    } else {
        format!("frontend/{path}")
    }
}

fn dependency_table(value: Option<&Value>) -> IndexMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|table| {
            table
                .iter()
                .filter_map(|(name, version)| {
                    version.as_str().map(|v| (name.clone(), v.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn normalize_dependencies(value: Option<&Value>) -> Dependencies {
    match value.and_then(Value::as_object) {
        Some(deps) => Dependencies {
            frontend: dependency_table(deps.get("frontend")),
            backend: dependency_table(deps.get("backend")),
        },
        None => Dependencies::starter(),
    }
}

/// Normalize a generated-project document.
///
/// Records without a path are dropped, as are repeats of a path already
/// seen. The returned project may have zero files; the caller decides
/// whether that is a failure.
pub fn normalize_project(document: &Map<String, Value>) -> GeneratedProject {
    let records = document
        .get("files")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let mut files = Vec::with_capacity(records.len());
    for record in records.iter().filter_map(Value::as_object) {
        let Some(raw_path) = text_field(record, "path") else {
            tracing::debug!("dropping generated file without a path");
            continue;
        };
        let path = prefix_path(raw_path.trim());
        if !seen.insert(path.clone()) {
            continue;
        }
        let content = record
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        files.push(GeneratedFile { path, content });
    }

    GeneratedProject {
        files,
        dependencies: normalize_dependencies(document.get("dependencies")),
        setup_instructions: text_or(
            document,
            "setup_instructions",
            DEFAULT_SETUP_INSTRUCTIONS,
        ),
    }
}

/// Keep the known document kinds that carry string content.
pub fn normalize_docs(document: &Map<String, Value>) -> IndexMap<DocKind, String> {
    document
        .iter()
        .filter_map(|(key, value)| {
            let kind = key.parse::<DocKind>().ok()?;
            let text = value.as_str()?;
            Some((kind, text.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeveritySummary;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn missing_fields_get_defaults() {
        let report = normalize_issues(&object(json!({
            "issues": [{"title": "Hardcoded secret", "severity": ""}]
        })));
        let issue = &report.issues[0];
        assert_eq!(issue.id, "item-1");
        assert_eq!(issue.severity, Severity::Medium);
        assert_eq!(issue.category, "quality");
        assert_eq!(issue.title, "Hardcoded secret");
        assert_eq!(issue.file, "unknown");
        assert_eq!(issue.line, 1);
        assert_eq!(issue.code_snippet, "");
        assert_eq!(issue.problem, "Issue detected");
        assert_eq!(issue.impact, "May cause problems");
        assert_eq!(issue.fix, "Review and fix");
        assert_eq!(issue.explanation, "See fix above");
    }

    #[test]
    fn ids_are_one_based_and_kept_when_present() {
        let report = normalize_issues(&object(json!({
            "issues": [{"id": "sec-1"}, {}, {"id": 7}]
        })));
        let ids: Vec<_> = report.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["sec-1", "item-2", "7"]);
    }

    #[test]
    fn summary_ignores_upstream_rollup() {
        let report = normalize_issues(&object(json!({
            "issues": [
                {"severity": "critical"},
                {"severity": "HIGH"},
                {"severity": "low"},
                {}
            ],
            "summary": {"critical": 9, "medium": 0, "low": 0}
        })));
        assert_eq!(
            report.summary,
            SeveritySummary {
                critical: 2,
                medium: 1,
                low: 1
            }
        );
    }

    #[test]
    fn non_object_records_and_missing_array() {
        let report = normalize_issues(&object(json!({"issues": ["oops", {"title": "x"}]})));
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].id, "item-1");

        let report = normalize_issues(&object(json!({"summary": {}})));
        assert!(report.issues.is_empty());
        assert_eq!(report.summary.total(), 0);
    }

    #[test]
    fn line_accepts_numeric_strings() {
        let report = normalize_issues(&object(json!({
            "issues": [{"line": "42"}, {"line": 0}, {"line": -3}]
        })));
        let lines: Vec<_> = report.issues.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![42, 1, 1]);
    }

    #[test]
    fn prefixes_follow_server_rule() {
        assert_eq!(prefix_path("frontend/src/App.tsx"), "frontend/src/App.tsx");
        assert_eq!(prefix_path("server.js"), "backend/server.js");
        assert_eq!(prefix_path("src/main.tsx"), "frontend/src/main.tsx");
        assert_eq!(prefix_path("./backend/db.js"), "backend/db.js");
    }

    #[test]
    fn project_defaults_and_dedupe() {
        let project = normalize_project(&object(json!({
            "files": [
                {"path": "index.html", "content": "<html/>"},
                {"path": "frontend/index.html", "content": "dup"},
                {"content": "no path"},
                {"path": "server.js", "content": "listen()"}
            ]
        })));
        let paths: Vec<_> = project.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["frontend/index.html", "backend/server.js"]);
        assert_eq!(project.files[0].content, "<html/>");
        assert_eq!(project.dependencies, Dependencies::starter());
        assert_eq!(project.setup_instructions, DEFAULT_SETUP_INSTRUCTIONS);
    }

    #[test]
    fn project_keeps_model_dependencies() {
        let project = normalize_project(&object(json!({
            "files": [],
            "dependencies": {"frontend": {"react": "^18.2.0", "bad": 1}},
            "setup_instructions": "npm i"
        })));
        assert!(project.files.is_empty());
        assert_eq!(project.dependencies.frontend.len(), 1);
        assert!(project.dependencies.backend.is_empty());
        assert_eq!(project.setup_instructions, "npm i");
    }

    #[test]
    fn docs_keep_known_string_kinds() {
        let docs = normalize_docs(&object(json!({
            "readme": "# App",
            "apiDocs": 3,
            "changelog": "# Changes",
            "deployment": "# Deploy"
        })));
        let kinds: Vec<_> = docs.keys().copied().collect();
        assert_eq!(kinds, vec![DocKind::Readme, DocKind::Deployment]);
    }
}
