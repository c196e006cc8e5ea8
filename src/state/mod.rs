//! Per-session application state.
//!
//! [`ProjectState`] is the single state object for one user session. All
//! mutation goes through its named operations; the last writer wins and
//! there is no undo. [`SessionStore`] keeps one state per session id in
//! a bounded in-memory cache; idle sessions are evicted.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use moka::future::Cache;
use tokio::sync::Mutex;

use crate::config::SessionsConfig;
use crate::layout;
use crate::models::architecture::{ArchitectureCheck, CATALOG, NodeData, check_architecture};
use crate::models::{
    CanvasNode, ChatMessage, Customizations, DocKind, Edge, FileDescriptor, FunctionCall,
    GeneratedProject, Issue, NodeCategory, Position,
};

/// A generated project saved into the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProject {
    /// Milliseconds since the Unix epoch at save time.
    pub saved_at: u64,
    #[serde(flatten)]
    pub project: GeneratedProject,
}

/// Everything the UI keeps for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectState {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<Edge>,
    pub customizations: Customizations,
    pub current_project: Option<SavedProject>,
    pub uploaded_files: Vec<FileDescriptor>,
    pub issues: Vec<Issue>,
    pub generated_docs: IndexMap<DocKind, String>,
    /// Chat transcripts keyed by tool name.
    pub chat_history: IndexMap<String, Vec<ChatMessage>>,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

impl ProjectState {
    /// Replace the canvas nodes and rebuild the edges from scratch.
    pub fn set_nodes(&mut self, nodes: Vec<CanvasNode>) {
        self.edges = layout::auto_connect(&nodes);
        self.nodes = nodes;
    }

    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.edges = edges;
    }

    pub fn set_customizations(&mut self, customizations: Customizations) {
        self.customizations = customizations;
    }

    /// Shallow merge; `design` is merged one level deep.
    pub fn update_customizations(&mut self, updates: Customizations) {
        self.customizations.merge(updates);
    }

    pub fn save_generated_project(&mut self, project: GeneratedProject) {
        self.current_project = Some(SavedProject {
            saved_at: now_millis(),
            project,
        });
    }

    pub fn set_uploaded_files(&mut self, files: Vec<FileDescriptor>) {
        self.uploaded_files = files;
    }

    pub fn set_issues(&mut self, issues: Vec<Issue>) {
        self.issues = issues;
    }

    pub fn set_generated_docs(&mut self, docs: IndexMap<DocKind, String>) {
        self.generated_docs = docs;
    }

    pub fn add_chat_message(&mut self, tool: &str, message: ChatMessage) {
        self.chat_history
            .entry(tool.to_string())
            .or_default()
            .push(message);
    }

    pub fn clear_chat_history(&mut self, tool: &str) {
        self.chat_history.insert(tool.to_string(), Vec::new());
    }

    pub fn clear_all(&mut self) {
        *self = ProjectState::default();
    }

    /// Advisory check of the current canvas.
    pub fn validation(&self) -> ArchitectureCheck {
        check_architecture(&self.nodes)
    }

    /// Apply a chat function call to the canvas or customizations.
    ///
    /// Returns `false` for unknown functions or unusable arguments.
    pub fn apply_function_call(&mut self, call: &FunctionCall) -> bool {
        match call.name.as_str() {
            "add_node" => {
                let Some(label) = call.args.get("label").and_then(Value::as_str) else {
                    return false;
                };
                let category = call
                    .args
                    .get("category")
                    .and_then(Value::as_str)
                    .and_then(|c| c.parse::<NodeCategory>().ok());
                let mut nodes = self.nodes.clone();
                nodes.push(catalog_node(label, category, &self.nodes));
                self.set_nodes(nodes);
                true
            }
            "remove_node" => {
                let Some(label) = call.args.get("label").and_then(Value::as_str) else {
                    return false;
                };
                let nodes: Vec<CanvasNode> = self
                    .nodes
                    .iter()
                    .filter(|n| n.data.label != label)
                    .cloned()
                    .collect();
                self.set_nodes(nodes);
                true
            }
            "update_customization" => {
                match serde_json::from_value::<Customizations>(call.args.clone()) {
                    Ok(updates) => {
                        self.update_customizations(updates);
                        true
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring malformed update_customization call");
                        false
                    }
                }
            }
            other => {
                tracing::warn!(function = other, "ignoring unknown function call");
                false
            }
        }
    }
}

/// Build a canvas node for `label`, placed below the lowest existing node.
fn catalog_node(label: &str, category: Option<NodeCategory>, existing: &[CanvasNode]) -> CanvasNode {
    let entry = CATALOG.iter().find(|e| e.label == label);
    let y = existing
        .iter()
        .map(|n| n.position.y)
        .reduce(f64::max)
        .map_or(100.0, |lowest| lowest + 100.0);

    CanvasNode {
        id: format!("{label}-{}", uuid::Uuid::new_v4().simple()),
        node_type: Some("custom".to_string()),
        position: Position { x: 250.0, y },
        data: NodeData {
            label: label.to_string(),
            icon: entry.map_or("📦", |e| e.icon).to_string(),
            category: category
                .or(entry.map(|e| e.category))
                .unwrap_or_default(),
            node_id: label.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-"),
        },
    }
}

/// In-memory session states, keyed by session id.
///
/// Capacity and idle expiry come from [`SessionsConfig`]; reading an evicted
/// session yields an empty state, like an unknown id.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, Arc<Mutex<ProjectState>>>,
}

impl SessionStore {
    pub fn new(config: &SessionsConfig) -> Self {
        let sessions = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_idle(config.idle())
            .build();
        Self { sessions }
    }

    /// Snapshot of a session. Unknown ids read as an empty state.
    pub async fn get(&self, id: &str) -> ProjectState {
        match self.sessions.get(id).await {
            Some(state) => state.lock().await.clone(),
            None => ProjectState::default(),
        }
    }

    /// Mutate a session in place, creating it on first use.
    pub async fn update<R>(&self, id: &str, f: impl FnOnce(&mut ProjectState) -> R) -> R {
        let entry = self
            .sessions
            .get_with(id.to_string(), async { Arc::default() })
            .await;
        let mut state = entry.lock().await;
        f(&mut state)
    }

    /// Drop a session. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).await.is_some()
    }

    /// Number of live sessions, after pending evictions have run.
    pub async fn len(&self) -> u64 {
        self.sessions.run_pending_tasks().await;
        self.sessions.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
