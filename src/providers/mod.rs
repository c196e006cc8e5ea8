//! ModelProvider trait and upstream model integration.
//!
//! Provides an abstraction layer over the hosted generative-text API so the
//! services and the recovery pipeline never see provider-specific request or
//! response shapes.

pub mod gemini;
pub mod retry;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::FunctionCall;

pub use retry::{generate_with_retry, RetryPolicy};

/// Errors from the upstream model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// HTTP 429 from the provider.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Any other non-2xx status. `body` is already truncated.
    #[error("upstream API error: {status} - {body}")]
    Http { status: u16, body: String },

    #[error("upstream request timed out after {0}s")]
    Timeout(u64),

    #[error("upstream transport error: {0}")]
    Transport(String),

    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    /// The provider answered but produced no candidate content.
    #[error("no response from AI")]
    EmptyReply,

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Only rate-limit signals are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited)
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A function the model may call, with a JSON-schema parameter object.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: Option<f32>,
}

/// One upstream call. Built per user action and discarded after use.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub turns: Vec<Turn>,
    pub tools: Vec<FunctionDeclaration>,
    pub config: GenerationConfig,
}

impl GenerationRequest {
    /// A single-turn request with no tools.
    pub fn prompt(text: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            turns: vec![Turn::user(text)],
            tools: Vec::new(),
            config,
        }
    }
}

/// Provider-neutral view of a model answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    /// Concatenation of every text part, in order.
    pub text: String,
    pub function_calls: Vec<FunctionCall>,
}

impl ModelReply {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.function_calls.is_empty()
    }
}

/// Trait for a hosted generative-text model.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<ModelReply, ProviderError>;
}
