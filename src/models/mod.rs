//! Shared types used across all modules.
//!
//! This module defines the core data structures for canvas nodes,
//! generated projects, review issues, documentation and chat. Other modules
//! import from here rather than reaching into each other's internals.

pub mod architecture;
pub mod chat;
pub mod docs;
pub mod issue;

pub use architecture::{
    CanvasNode, Customizations, Design, Edge, GeneratedFile, GeneratedProject, NodeCategory,
    Position,
};
pub use chat::{ChatMessage, ChatRole, FunctionCall, ToolContext, ToolKind};
pub use docs::{DocKind, FileDescriptor};
pub use issue::{Issue, ReviewReport, Severity, SeveritySummary};

/// A source file handed to the reviewer, from an upload or a repository.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}
