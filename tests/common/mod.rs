//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use devforge::config::Config;
use devforge::models::{CanvasNode, FunctionCall, NodeCategory, Position};
use devforge::models::architecture::NodeData;
use devforge::providers::{GenerationRequest, ModelProvider, ModelReply, ProviderError};
use devforge::services::Services;

/// Replays canned outcomes in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedProvider {
    outcomes: Mutex<Vec<Result<ModelReply, ProviderError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    pub fn new(mut outcomes: Vec<Result<ModelReply, ProviderError>>) -> Arc<Self> {
        outcomes.reverse();
        Arc::new(Self {
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A provider that answers every call with `text`.
    pub fn text(text: &str) -> Arc<Self> {
        Self::new(vec![Ok(reply(text))])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<ModelReply, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(ProviderError::EmptyReply))
    }
}

pub fn reply(text: &str) -> ModelReply {
    ModelReply {
        text: text.to_string(),
        function_calls: vec![],
    }
}

pub fn call(name: &str, args: serde_json::Value) -> FunctionCall {
    FunctionCall {
        name: name.to_string(),
        args,
    }
}

/// Config with no backoff so rate-limit retries run instantly.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.provider.initial_backoff_secs = 0;
    config.provider.api_key = Some("test-key".into());
    config
}

pub fn services(provider: Arc<ScriptedProvider>) -> Services {
    Services::new(provider, test_config()).unwrap()
}

pub fn node(label: &str, category: NodeCategory, y: f64) -> CanvasNode {
    CanvasNode {
        id: format!("{}-1", label.to_lowercase()),
        node_type: Some("custom".into()),
        position: Position { x: 250.0, y },
        data: NodeData {
            label: label.to_string(),
            icon: String::new(),
            category,
            node_id: label.to_lowercase(),
        },
    }
}

/// React + Express + PostgreSQL, the smallest canvas that can be generated.
pub fn valid_canvas() -> Vec<CanvasNode> {
    vec![
        node("React", NodeCategory::Frontend, 100.0),
        node("Express", NodeCategory::Backend, 200.0),
        node("PostgreSQL", NodeCategory::Database, 300.0),
    ]
}

pub const PROJECT_REPLY: &str = r#"Here is your project:
```json
{
  "files": [
    {"path": "frontend/src/App.jsx", "content": "export default function App() { return null; }"},
    {"path": "server/index.js", "content": "const express = require('express');"},
    {"path": "frontend/src/App.jsx", "content": "duplicate"}
  ],
  "setup_instructions": "npm install"
}
```
Let me know if you need anything else."#;

/// A review reply cut off in the middle of the second issue.
pub const TRUNCATED_REVIEW_REPLY: &str = r#"{"issues": [
  {"id": "1", "severity": "high", "title": "SQL injection", "file": "db.js", "line": 12},
  {"id": "2", "severity": "low", "title": "Unused var"},
  {"id": "3", "severity": "medium", "title": "Missing awa"#;
