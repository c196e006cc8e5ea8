use serde::{Deserialize, Serialize};

use crate::models::{ChatMessage, ChatRole, FunctionCall, ToolContext, ToolKind};
use crate::prompts::{CHAT_CONFIG, architecture_functions, chat_system_prompt};
use crate::providers::{GenerationRequest, ProviderError, Turn};

use super::{ServiceError, Services};

pub const RATE_LIMIT_MESSAGE: &str =
    "⚠️ I am currently overloaded (Rate Limit). Please wait a minute and try again.";
pub const EMPTY_REPLY_MESSAGE: &str = "⚠️ I processed your request but didn't generate a text response. Please check if the action was performed.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub tool_context: Option<ToolContext>,
    pub chat_history: Vec<ChatMessage>,
    pub session_id: Option<String>,
}

/// Reply shown in the chat panel. Failures are rendered into `message`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub function_calls: Vec<FunctionCall>,
}

impl ChatResponse {
    fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            function_calls: Vec::new(),
        }
    }
}

fn build_request(message: &str, context: &ToolContext, history: &[ChatMessage]) -> GenerationRequest {
    let mut turns = Vec::with_capacity(history.len() + 2);
    turns.push(Turn::user(chat_system_prompt(context)));
    turns.extend(history.iter().map(|m| match m.role {
        ChatRole::User => Turn::user(&m.content),
        ChatRole::Assistant => Turn::model(&m.content),
    }));
    turns.push(Turn::user(message));

    let tools = match context.kind() {
        ToolKind::ArchitectureBuilder => architecture_functions(),
        _ => Vec::new(),
    };
    GenerationRequest {
        turns,
        tools,
        config: CHAT_CONFIG,
    }
}

impl Services {
    /// Answer a chat message.
    ///
    /// Only missing input is an error; upstream failures become a
    /// displayable message so the chat panel always has something to show.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ServiceError> {
        let context = match request.tool_context {
            Some(ctx) if !request.message.trim().is_empty() => ctx,
            _ => {
                return Err(ServiceError::Validation(
                    "Message and toolContext required".to_string(),
                ));
            }
        };

        let generation = build_request(&request.message, &context, &request.chat_history);
        let response = match self.call_model(&generation).await {
            Ok(reply) => {
                let message = if !reply.text.trim().is_empty() {
                    reply.text
                } else if !reply.function_calls.is_empty() {
                    let names: Vec<&str> =
                        reply.function_calls.iter().map(|c| c.name.as_str()).collect();
                    format!("✅ Processed action(s): {}", names.join(", "))
                } else {
                    "Done!".to_string()
                };
                ChatResponse {
                    message,
                    function_calls: reply.function_calls,
                }
            }
            Err(ProviderError::RateLimited) => {
                tracing::warn!("chat rate limited after retries");
                ChatResponse::text(RATE_LIMIT_MESSAGE)
            }
            Err(ProviderError::EmptyReply) => ChatResponse::text(EMPTY_REPLY_MESSAGE),
            Err(e) => {
                tracing::error!(error = %e, "chat request failed");
                ChatResponse::text(format!("❌ Error: {e}"))
            }
        };

        if let Some(id) = request.session_id.as_deref() {
            let user = ChatMessage {
                role: ChatRole::User,
                content: request.message.clone(),
                timestamp: None,
            };
            let assistant = ChatMessage {
                role: ChatRole::Assistant,
                content: response.message.clone(),
                timestamp: None,
            };
            let calls = response.function_calls.clone();
            self.sessions
                .update(id, |state| {
                    state.add_chat_message(&context.tool, user);
                    state.add_chat_message(&context.tool, assistant);
                    for call in &calls {
                        state.apply_function_call(call);
                    }
                })
                .await;
        }

        Ok(response)
    }
}
