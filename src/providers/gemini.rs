//! Gemini `generateContent` adapter.
//!
//! Maps [`GenerationRequest`] onto the `{contents, tools, generationConfig}`
//! wire shape and folds `candidates[0].content.parts[]` back into a
//! [`ModelReply`]. A 429 is the only distinguished status.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::constants::{self, ERROR_BODY_PREVIEW_CHARS, truncate_chars};
use crate::models::FunctionCall;

use super::{GenerationRequest, ModelProvider, ModelReply, ProviderError, Role};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    contents: Vec<WireContent<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize)]
struct WireContent<'a> {
    role: &'static str,
    parts: Vec<WireTextPart<'a>>,
}

#[derive(Serialize)]
struct WireTextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool<'a> {
    function_declarations: Vec<WireFunctionDeclaration<'a>>,
}

#[derive(Serialize)]
struct WireFunctionDeclaration<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Deserialize)]
struct WireCandidate {
    content: Option<WireCandidateContent>,
}

#[derive(Deserialize)]
struct WireCandidateContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    text: Option<String>,
    function_call: Option<WireFunctionCall>,
}

#[derive(Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

fn to_wire(request: &GenerationRequest) -> WireRequest<'_> {
    let contents = request
        .turns
        .iter()
        .map(|turn| WireContent {
            role: match turn.role {
                Role::User => "user",
                Role::Model => "model",
            },
            parts: vec![WireTextPart { text: &turn.text }],
        })
        .collect();

    let tools = if request.tools.is_empty() {
        Vec::new()
    } else {
        vec![WireTool {
            function_declarations: request
                .tools
                .iter()
                .map(|d| WireFunctionDeclaration {
                    name: &d.name,
                    description: &d.description,
                    parameters: &d.parameters,
                })
                .collect(),
        }]
    };

    WireRequest {
        contents,
        tools,
        generation_config: WireGenerationConfig {
            temperature: request.config.temperature,
            max_output_tokens: request.config.max_output_tokens,
            top_p: request.config.top_p,
        },
    }
}

fn from_wire(response: WireResponse) -> Result<ModelReply, ProviderError> {
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or(ProviderError::EmptyReply)?;

    let mut reply = ModelReply::default();
    for part in content.parts {
        if let Some(text) = part.text {
            reply.text.push_str(&text);
        }
        if let Some(call) = part.function_call {
            let args = if call.args.is_null() {
                serde_json::json!({})
            } else {
                call.args
            };
            reply.function_calls.push(FunctionCall {
                name: call.name,
                args,
            });
        }
    }
    Ok(reply)
}

/// Gemini-backed [`ModelProvider`].
pub struct GeminiProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

impl GeminiProvider {
    /// Create a provider from configuration. Fails without an API key.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "no API key found. Set {} or {}.",
                constants::ENV_API_KEY,
                constants::ENV_PROVIDER_API_KEY
            ))
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(constants::USER_AGENT)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<ModelReply, ProviderError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&to_wire(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout_secs)
                } else {
                    ProviderError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "upstream model returned an error");
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: truncate_chars(&body, ERROR_BODY_PREVIEW_CHARS).to_string(),
            });
        }

        let wire: WireResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::InvalidResponse(e.to_string())
            }
        })?;

        let reply = from_wire(wire)?;
        tracing::debug!(
            chars = reply.text.chars().count(),
            calls = reply.function_calls.len(),
            "upstream model replied"
        );
        Ok(reply)
    }
}
