//! Chat assistant types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Author of a chat message. Anything other than `user` is the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(other)]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Milliseconds since the Unix epoch, when the client supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// The tool the user is working in when chatting.
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString)]
pub enum ToolKind {
    #[strum(serialize = "architecture-builder")]
    ArchitectureBuilder,
    #[strum(serialize = "code-reviewer")]
    CodeReviewer,
    #[strum(serialize = "docs-generator")]
    DocsGenerator,
    #[strum(default)]
    Other(String),
}

/// Snapshot of UI state attached to a chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolContext {
    pub tool: String,
    #[serde(default)]
    pub nodes: Vec<serde_json::Value>,
}

impl ToolContext {
    pub fn kind(&self) -> ToolKind {
        // `#[strum(default)]` makes parsing infallible.
        self.tool
            .parse()
            .unwrap_or_else(|_| ToolKind::Other(self.tool.clone()))
    }
}

/// A structured function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}
