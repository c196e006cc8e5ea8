use serde::Deserialize;

use crate::models::GeneratedFile;
use crate::sandbox::SandboxLinks;

use super::{ServiceError, Services};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SandboxRequest {
    pub files: Vec<GeneratedFile>,
}

impl Services {
    /// Create a live preview of the generated frontend.
    pub async fn create_sandbox(
        &self,
        request: SandboxRequest,
    ) -> Result<SandboxLinks, ServiceError> {
        if request.files.is_empty() {
            return Err(ServiceError::Validation("No files provided".to_string()));
        }
        Ok(self.sandbox.create(&request.files).await?)
    }
}
