//! User-facing operations.
//!
//! Each operation validates its input, builds a prompt, calls the model
//! through the rate-limit retry, and runs the reply through the recovery
//! pipeline. When a request names a session, the result is also recorded
//! in that session's [`ProjectState`](crate::state::ProjectState).

mod chat;
mod docs;
mod generate;
mod review;
mod sandbox;

use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::providers::{
    GenerationRequest, ModelProvider, ModelReply, ProviderError, RetryPolicy, generate_with_retry,
};
use crate::recovery::RecoveryError;
use crate::sandbox::{SandboxClient, SandboxError};
use crate::sources::{GithubClient, SourceError};
use crate::state::SessionStore;

pub use chat::{ChatRequest, ChatResponse, EMPTY_REPLY_MESSAGE, RATE_LIMIT_MESSAGE};
pub use docs::DocsRequest;
pub use generate::GenerateCodeRequest;
pub use review::{ReviewInput, ReviewOutcome};
pub use sandbox::SandboxRequest;

/// Errors from a user-facing operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or unusable input. Never retried.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

/// Shared dependencies of every operation.
#[derive(Clone)]
pub struct Services {
    provider: Arc<dyn ModelProvider>,
    config: Arc<Config>,
    github: Arc<GithubClient>,
    sandbox: Arc<SandboxClient>,
    sessions: SessionStore,
}

impl Services {
    pub fn new(provider: Arc<dyn ModelProvider>, config: Config) -> Result<Self, ServiceError> {
        let github = GithubClient::new(config.github.clone())?;
        let sandbox = SandboxClient::new(config.sandbox.clone())?;
        let sessions = SessionStore::new(&config.sessions);
        Ok(Self {
            provider,
            config: Arc::new(config),
            github: Arc::new(github),
            sandbox: Arc::new(sandbox),
            sessions,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    async fn call_model(&self, request: &GenerationRequest) -> Result<ModelReply, ProviderError> {
        let policy = RetryPolicy::from_config(&self.config.provider);
        generate_with_retry(self.provider.as_ref(), request, policy).await
    }

    /// Call the model and require a text reply.
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let reply = self.call_model(request).await?;
        if reply.text.trim().is_empty() {
            return Err(ProviderError::EmptyReply);
        }
        tracing::debug!(chars = reply.text.chars().count(), "model reply received");
        Ok(reply.text)
    }
}
