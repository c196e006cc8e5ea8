//! Code-review issue types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a review issue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    Critical,
}

impl Severity {
    /// Map the spellings models actually produce onto the three levels.
    ///
    /// Unrecognised values fall back to [`Severity::Medium`] rather than
    /// failing, so a single odd record never drops out of the report.
    pub fn from_loose(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "critical" | "high" | "severe" | "blocker" | "fatal" | "error" => Severity::Critical,
            "low" | "minor" | "info" | "note" | "trivial" | "style" | "suggestion" => {
                Severity::Low
            }
            _ => Severity::Medium,
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Severity::from_loose(&s))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A single normalized review issue. Every field is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub severity: Severity,
    pub category: String,
    pub title: String,
    pub file: String,
    pub line: u32,
    pub code_snippet: String,
    pub problem: String,
    pub impact: String,
    pub fix: String,
    pub explanation: String,
}

/// Issue counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub critical: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeveritySummary {
    /// Compute the summary from a list of issues.
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut s = SeveritySummary::default();
        for issue in issues {
            match issue.severity {
                Severity::Critical => s.critical += 1,
                Severity::Medium => s.medium += 1,
                Severity::Low => s.low += 1,
            }
        }
        s
    }

    pub fn total(&self) -> usize {
        self.critical + self.medium + self.low
    }
}

/// Normalized output of the code reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub issues: Vec<Issue>,
    pub summary: SeveritySummary,
}

impl ReviewReport {
    /// Build a report whose summary is derived from `issues`.
    pub fn new(issues: Vec<Issue>) -> Self {
        let summary = SeveritySummary::from_issues(&issues);
        Self { issues, summary }
    }
}
