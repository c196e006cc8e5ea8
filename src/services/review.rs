use serde::Serialize;

use crate::models::{FileDescriptor, ReviewReport, SourceFile};
use crate::prompts::{REVIEW_CONFIG, review_prompt};
use crate::providers::GenerationRequest;
use crate::recovery::recover_review;
use crate::sources::{Upload, validate_uploads};

use super::{ServiceError, Services};

/// Where the code under review comes from.
#[derive(Debug, Clone)]
pub enum ReviewInput {
    Repository(String),
    Uploads(Vec<Upload>),
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    /// Every acquired file, not only the ones sent to the model.
    pub files: Vec<FileDescriptor>,
    #[serde(flatten)]
    pub report: ReviewReport,
}

impl Services {
    /// Review uploaded files or a public repository.
    ///
    /// Size limits are enforced before the model is called.
    pub async fn review_code(
        &self,
        input: ReviewInput,
        session_id: Option<&str>,
    ) -> Result<ReviewOutcome, ServiceError> {
        let files: Vec<SourceFile> = match input {
            ReviewInput::Uploads(uploads) => validate_uploads(uploads, &self.config.limits)?,
            ReviewInput::Repository(url) if url.trim().is_empty() => {
                return Err(ServiceError::Validation("GitHub URL is required".to_string()));
            }
            ReviewInput::Repository(url) => self.github.fetch_repository(&url).await?,
        };

        if files.is_empty() {
            return Err(ServiceError::Validation(
                "No code files found to analyze".to_string(),
            ));
        }

        tracing::info!(
            files = files.len(),
            analyzed = files.len().min(self.config.limits.review_max_files),
            "reviewing code"
        );
        let prompt = review_prompt(&files, &self.config.limits);
        let text = self
            .generate_text(&GenerationRequest::prompt(prompt, REVIEW_CONFIG))
            .await?;
        let report = recover_review(&text)?;
        tracing::info!(issues = report.issues.len(), "review complete");

        let descriptors: Vec<FileDescriptor> = files
            .iter()
            .map(|f| FileDescriptor {
                name: None,
                path: Some(f.path.clone()),
                size: Some(f.content.len() as u64),
            })
            .collect();

        if let Some(id) = session_id {
            let (uploaded, issues) = (descriptors.clone(), report.issues.clone());
            self.sessions
                .update(id, |state| {
                    state.set_uploaded_files(uploaded);
                    state.set_issues(issues);
                })
                .await;
        }

        Ok(ReviewOutcome {
            files: descriptors,
            report,
        })
    }
}
