//! Response recovery pipeline.
//!
//! Turns model text that should be a JSON object, but may be fenced,
//! wrapped in prose or truncated, into the best available document. The
//! strategies run in order and the first success wins:
//!
//! 1. direct parse of the trimmed text
//! 2. parse the body of each markdown fenced block
//! 3. slice from the first `{` to the last `}` (of the whole text, then of
//!    each block), then each balanced `{...}` span, then parse
//! 4. per-record salvage through the configured [`RecordSalvager`]s, over
//!    each block and then the whole text
//!
//! Within steps 2 and 3 a candidate holding the document's records key is
//! preferred over one that does not, so a small example object in a code
//! block never shadows the payload.
//!
//! When every strategy fails the caller gets a [`RecoveryError`] with a
//! bounded preview of the raw text and a hint for the user.

pub mod extract;
pub mod normalize;
pub mod salvage;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::constants::{DIAGNOSTIC_PREVIEW_CHARS, truncate_chars};
use crate::models::{DocKind, GeneratedProject, ReviewReport};

pub use normalize::{normalize_docs, normalize_issues, normalize_project};
pub use salvage::{ArrayRecordSalvager, FileRecordSalvager, RecordSalvager, StringFieldSalvager};

pub const REVIEW_HINT: &str =
    "The AI returned invalid JSON. Try uploading different files or fewer files.";
pub const CODE_HINT: &str = "Try clicking Generate again - sometimes AI response is incomplete";
pub const DOCS_HINT: &str =
    "The AI generated invalid JSON. Please try again with fewer files or simpler requirements.";

/// Errors raised when a whole document cannot be recovered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    /// No strategy produced a document.
    #[error("failed to parse AI response as {document}")]
    Unsalvageable {
        document: &'static str,
        hint: &'static str,
        preview: String,
    },

    /// A document was recovered but holds nothing usable.
    #[error("{message}")]
    Empty {
        message: String,
        hint: &'static str,
        preview: String,
    },
}

impl RecoveryError {
    pub fn hint(&self) -> &'static str {
        match self {
            RecoveryError::Unsalvageable { hint, .. } | RecoveryError::Empty { hint, .. } => hint,
        }
    }

    /// The first [`DIAGNOSTIC_PREVIEW_CHARS`] characters of the raw text.
    pub fn preview(&self) -> &str {
        match self {
            RecoveryError::Unsalvageable { preview, .. } | RecoveryError::Empty { preview, .. } => {
                preview
            }
        }
    }
}

/// Bounded diagnostic sample of raw model text.
pub fn preview(raw: &str) -> String {
    truncate_chars(raw, DIAGNOSTIC_PREVIEW_CHARS).to_string()
}

/// Which strategy produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Strategy {
    Direct,
    MarkdownStrip,
    BraceExtraction,
    Salvage,
}

/// A recovered, not yet normalized, document.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub document: Map<String, Value>,
    pub strategy: Strategy,
}

/// The kind of document a pipeline expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentShape {
    /// Human-readable name used in errors and logs.
    pub name: &'static str,
    /// Top-level key holding the records, if the shape has one.
    pub records_key: Option<&'static str>,
    pub hint: &'static str,
}

pub struct RecoveryPipeline {
    shape: DocumentShape,
    salvagers: Vec<Box<dyn RecordSalvager>>,
}

impl RecoveryPipeline {
    pub fn new(shape: DocumentShape, salvagers: Vec<Box<dyn RecordSalvager>>) -> Self {
        Self { shape, salvagers }
    }

    /// Review reports: `{issues: [...], summary}`.
    pub fn issues() -> Self {
        Self::new(
            DocumentShape {
                name: "review report",
                records_key: Some("issues"),
                hint: REVIEW_HINT,
            },
            vec![Box::new(ArrayRecordSalvager::new("issues"))],
        )
    }

    /// Generated projects: `{files: [...], dependencies, setup_instructions}`.
    pub fn files() -> Self {
        Self::new(
            DocumentShape {
                name: "generated project",
                records_key: Some("files"),
                hint: CODE_HINT,
            },
            vec![
                Box::new(FileRecordSalvager),
                Box::new(ArrayRecordSalvager::new("files")),
            ],
        )
    }

    /// Documentation sets: `{readme, apiDocs, ...}`.
    pub fn docs() -> Self {
        let keys: Vec<&str> = DocKind::iter().map(DocKind::key).collect();
        Self::new(
            DocumentShape {
                name: "documentation",
                records_key: None,
                hint: DOCS_HINT,
            },
            vec![Box::new(StringFieldSalvager::new(&keys))],
        )
    }

    pub fn shape(&self) -> &DocumentShape {
        &self.shape
    }

    /// Run the strategies in order and return the first document found.
    pub fn recover(&self, raw: &str) -> Result<Recovered, RecoveryError> {
        let trimmed = raw.trim();
        tracing::debug!(
            document = self.shape.name,
            chars = trimmed.chars().count(),
            "recovering model response"
        );

        if let Some(document) = extract::parse_object(trimmed) {
            return Ok(self.found(document, Strategy::Direct));
        }

        let blocks = extract::fenced_blocks(trimmed);
        if let Some(document) = self.pick(blocks.iter().filter_map(|b| extract::parse_object(b))) {
            return Ok(self.found(document, Strategy::MarkdownStrip));
        }

        let slices = std::iter::once(trimmed)
            .chain(blocks.iter().map(String::as_str))
            .filter_map(extract::brace_slice)
            .chain(extract::balanced_objects(trimmed));
        if let Some(document) = self.pick(slices.filter_map(extract::parse_object)) {
            return Ok(self.found(document, Strategy::BraceExtraction));
        }

        let texts: Vec<&str> = blocks
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(trimmed))
            .collect();
        for salvager in &self.salvagers {
            if let Some(document) = texts.iter().find_map(|text| salvager.salvage(text)) {
                tracing::warn!(
                    document = self.shape.name,
                    salvager = salvager.name(),
                    "response was not valid JSON, salvaged partial records"
                );
                return Ok(self.found(document, Strategy::Salvage));
            }
        }

        let preview = preview(raw);
        tracing::error!(
            document = self.shape.name,
            preview = %preview,
            "all recovery strategies failed"
        );
        Err(RecoveryError::Unsalvageable {
            document: self.shape.name,
            hint: self.shape.hint,
            preview,
        })
    }

    /// The first candidate holding the records key, else the first candidate.
    fn pick(
        &self,
        candidates: impl Iterator<Item = Map<String, Value>>,
    ) -> Option<Map<String, Value>> {
        let mut fallback = None;
        for document in candidates {
            match self.shape.records_key {
                Some(key) if !document.contains_key(key) => {
                    fallback.get_or_insert(document);
                }
                _ => return Some(document),
            }
        }
        fallback
    }

    /// Ensure the records key holds an array before handing the document on.
    fn found(&self, mut document: Map<String, Value>, strategy: Strategy) -> Recovered {
        tracing::debug!(document = self.shape.name, %strategy, "recovered document");
        if let Some(key) = self.shape.records_key {
            if !document.get(key).is_some_and(Value::is_array) {
                document.insert(key.to_string(), Value::Array(Vec::new()));
            }
        }
        Recovered { document, strategy }
    }
}

/// Recover and normalize a review report.
pub fn recover_review(raw: &str) -> Result<ReviewReport, RecoveryError> {
    let recovered = RecoveryPipeline::issues().recover(raw)?;
    Ok(normalize_issues(&recovered.document))
}

/// Recover and normalize a generated project. Zero files is a failure.
pub fn recover_project(raw: &str) -> Result<GeneratedProject, RecoveryError> {
    let recovered = RecoveryPipeline::files().recover(raw)?;
    let project = normalize_project(&recovered.document);
    if project.files.is_empty() {
        return Err(RecoveryError::Empty {
            message: "No files generated".to_string(),
            hint: CODE_HINT,
            preview: preview(raw),
        });
    }
    Ok(project)
}

/// Recover the documentation set. A document with no known kind is a
/// failure that lists the keys received.
pub fn recover_docs(raw: &str) -> Result<IndexMap<DocKind, String>, RecoveryError> {
    let recovered = RecoveryPipeline::docs().recover(raw)?;
    let docs = normalize_docs(&recovered.document);
    if docs.is_empty() {
        let received: Vec<&str> = recovered.document.keys().map(String::as_str).collect();
        return Err(RecoveryError::Empty {
            message: format!(
                "No documentation generated (received keys: [{}])",
                received.join(", ")
            ),
            hint: DOCS_HINT,
            preview: preview(raw),
        });
    }
    Ok(docs)
}
