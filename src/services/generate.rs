use serde::Deserialize;

use crate::models::architecture::ready_for_generation;
use crate::models::{CanvasNode, Customizations, GeneratedProject};
use crate::prompts::{CODE_CONFIG, architecture_prompt};
use crate::providers::GenerationRequest;
use crate::recovery::recover_project;

use super::{ServiceError, Services};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateCodeRequest {
    pub nodes: Vec<CanvasNode>,
    pub customizations: Customizations,
    pub session_id: Option<String>,
}

impl Services {
    /// Generate a full-stack project for the canvas.
    pub async fn generate_code(
        &self,
        request: GenerateCodeRequest,
    ) -> Result<GeneratedProject, ServiceError> {
        if !ready_for_generation(&request.nodes) {
            return Err(ServiceError::Validation(
                "Invalid architecture. Need 1 frontend + 1 backend + 1+ database".to_string(),
            ));
        }

        tracing::info!(
            nodes = request.nodes.len(),
            project = request.customizations.project_name(),
            "generating project"
        );
        let prompt = architecture_prompt(&request.nodes, &request.customizations);
        let text = self
            .generate_text(&GenerationRequest::prompt(prompt, CODE_CONFIG))
            .await?;
        let project = recover_project(&text)?;
        tracing::info!(files = project.files.len(), "project generated");

        if let Some(id) = request.session_id.as_deref() {
            let saved = project.clone();
            self.sessions
                .update(id, |state| state.save_generated_project(saved))
                .await;
        }
        Ok(project)
    }
}
