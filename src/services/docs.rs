use indexmap::IndexMap;
use serde::Deserialize;

use crate::models::{DocKind, FileDescriptor};
use crate::prompts::{DOCS_CONFIG, docs_prompt};
use crate::providers::GenerationRequest;
use crate::recovery::recover_docs;

use super::{ServiceError, Services};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocsRequest {
    pub files: Vec<FileDescriptor>,
    pub github_url: Option<String>,
    /// Requested kinds by wire name. Unknown names are ignored.
    pub doc_types: Vec<String>,
    pub style: Option<String>,
    pub session_id: Option<String>,
}

impl DocsRequest {
    fn kinds(&self) -> Vec<DocKind> {
        let mut kinds = Vec::new();
        for name in &self.doc_types {
            match name.parse::<DocKind>() {
                Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Ok(_) => {}
                Err(_) => tracing::debug!(name = %name, "ignoring unknown documentation type"),
            }
        }
        kinds
    }
}

impl Services {
    /// Generate the requested documents for a file listing or repository.
    pub async fn generate_docs(
        &self,
        request: DocsRequest,
    ) -> Result<IndexMap<DocKind, String>, ServiceError> {
        let mut files = request.files.clone();
        if files.is_empty() {
            if let Some(url) = request.github_url.as_deref().filter(|u| !u.trim().is_empty()) {
                files = match self.github.list_doc_files(url).await {
                    Ok(listed) => listed,
                    Err(e) => {
                        tracing::warn!(error = %e, "could not list repository files");
                        Vec::new()
                    }
                };
            }
        }
        if files.is_empty() {
            return Err(ServiceError::Validation(
                "No files provided and failed to fetch from GitHub".to_string(),
            ));
        }

        let kinds = request.kinds();
        if kinds.is_empty() {
            return Err(ServiceError::Validation(
                "No documentation types selected".to_string(),
            ));
        }

        tracing::info!(files = files.len(), kinds = ?kinds, "generating documentation");
        let prompt = docs_prompt(
            &files,
            &kinds,
            request.style.as_deref(),
            &self.config.limits,
        );
        let text = self
            .generate_text(&GenerationRequest::prompt(prompt, DOCS_CONFIG))
            .await?;
        let docs = recover_docs(&text)?;
        tracing::info!(generated = docs.len(), "documentation generated");

        if let Some(id) = request.session_id.as_deref() {
            let saved = docs.clone();
            self.sessions
                .update(id, |state| state.set_generated_docs(saved))
                .await;
        }
        Ok(docs)
    }
}
