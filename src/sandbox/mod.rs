//! Live preview of a generated frontend through the CodeSandbox define API.
//!
//! Only `frontend/` files are submitted, with the prefix removed. Whatever
//! the generator left out of a runnable React app (manifest, root HTML,
//! entry point, `App` component, stylesheet) is synthesized here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::SandboxConfig;
use crate::constants::{ERROR_BODY_PREVIEW_CHARS, USER_AGENT, truncate_chars};
use crate::models::GeneratedFile;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    #[error("CodeSandbox API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("CodeSandbox request failed: {0}")]
    Transport(String),

    #[error("invalid CodeSandbox response: {0}")]
    InvalidResponse(String),
}

/// Build tool the generated frontend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toolchain {
    Vite,
    ReactScripts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SandboxFile {
    pub content: String,
}

/// Files ready for submission, keyed by sandbox-relative path.
pub type SandboxFiles = IndexMap<String, SandboxFile>;

const PREVIEW_TITLE: &str = "DevForge Preview";

const FALLBACK_APP: &str = r#"import React from 'react';

function App() {
  return (
    <div style={{ minHeight: '100vh', display: 'flex', alignItems: 'center', justifyContent: 'center', fontFamily: 'system-ui, sans-serif', textAlign: 'center' }}>
      <div>
        <h1>DevForge Preview</h1>
        <p>Your generated app will appear here.</p>
        <p>No App component was generated. Try regenerating with simpler requirements.</p>
      </div>
    </div>
  );
}

export default App;
"#;

const BASE_CSS: &str = "* {\n  margin: 0;\n  padding: 0;\n  box-sizing: border-box;\n}\n\n\
body {\n  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', sans-serif;\n  \
-webkit-font-smoothing: antialiased;\n}\n\ncode {\n  font-family: 'Courier New', monospace;\n}\n";

fn has_any(files: &SandboxFiles, candidates: &[&str]) -> bool {
    candidates.iter().any(|p| files.contains_key(*p))
}

fn insert_missing(files: &mut SandboxFiles, path: &str, content: impl FnOnce() -> String) {
    if !files.contains_key(path) {
        tracing::debug!(path, "synthesizing missing sandbox file");
        files.insert(path.to_string(), SandboxFile { content: content() });
    }
}

fn package_json(toolchain: Toolchain) -> String {
    let manifest = match toolchain {
        Toolchain::Vite => json!({
            "name": "preview",
            "type": "module",
            "scripts": {"dev": "vite", "build": "vite build"},
            "dependencies": {"react": "^18.2.0", "react-dom": "^18.2.0"},
            "devDependencies": {
                "@types/react": "^18.2.0",
                "@types/react-dom": "^18.2.0",
                "@vitejs/plugin-react": "^4.0.0",
                "typescript": "^5.0.0",
                "vite": "^4.3.9"
            }
        }),
        Toolchain::ReactScripts => json!({
            "name": "preview",
            "dependencies": {
                "react": "^18.2.0",
                "react-dom": "^18.2.0",
                "react-scripts": "5.0.1",
                "react-router-dom": "^6.8.0"
            },
            "scripts": {"start": "react-scripts start", "build": "react-scripts build"},
            "browserslist": {
                "production": [">0.2%", "not dead"],
                "development": ["last 1 chrome version"]
            }
        }),
    };
    serde_json::to_string_pretty(&manifest).unwrap_or_else(|_| manifest.to_string())
}

fn root_html(entry_script: Option<&str>) -> String {
    let script = entry_script
        .map(|src| format!("\n    <script type=\"module\" src=\"/{src}\"></script>"))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n  <head>\n    <meta charset=\"utf-8\" />\n    \
        <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n    \
        <title>{PREVIEW_TITLE}</title>\n  </head>\n  <body>\n    \
        <noscript>You need to enable JavaScript to run this app.</noscript>\n    \
        <div id=\"root\"></div>{script}\n  </body>\n</html>\n"
    )
}

fn entry_point() -> String {
    "import React from 'react';\n\
    import ReactDOM from 'react-dom/client';\n\
    import App from './App';\n\
    import './index.css';\n\n\
    ReactDOM.createRoot(document.getElementById('root')).render(\n  \
    <React.StrictMode>\n    <App />\n  </React.StrictMode>\n);\n"
        .to_string()
}

/// Detect the toolchain and whether the sources are TypeScript.
pub fn detect(files: &[GeneratedFile]) -> (Toolchain, bool) {
    let vite = files.iter().any(|f| f.path.contains("vite.config"));
    let typescript = files
        .iter()
        .any(|f| f.path.ends_with(".ts") || f.path.ends_with(".tsx"));
    let toolchain = if vite {
        Toolchain::Vite
    } else {
        Toolchain::ReactScripts
    };
    (toolchain, typescript)
}

/// Select the frontend files and fill in a minimal runnable scaffold.
pub fn prepare_files(files: &[GeneratedFile]) -> SandboxFiles {
    let mut prepared: SandboxFiles = files
        .iter()
        .filter_map(|f| {
            f.path.strip_prefix("frontend/").map(|path| {
                (
                    path.to_string(),
                    SandboxFile {
                        content: f.content.clone(),
                    },
                )
            })
        })
        .collect();

    let (toolchain, typescript) = detect(files);
    insert_missing(&mut prepared, "package.json", || package_json(toolchain));

    match toolchain {
        Toolchain::Vite => {
            let ext = if typescript { "tsx" } else { "jsx" };
            let existing_entry = ["src/main.tsx", "src/main.jsx", "src/main.ts", "src/main.js"]
                .into_iter()
                .find(|p| prepared.contains_key(*p))
                .map(str::to_string);
            let entry = match existing_entry {
                Some(path) => path,
                None => {
                    let path = format!("src/main.{ext}");
                    insert_missing(&mut prepared, &path, entry_point);
                    path
                }
            };
            insert_missing(&mut prepared, "index.html", || root_html(Some(&entry)));
            if !has_any(&prepared, &["src/App.tsx", "src/App.jsx", "src/App.js"]) {
                insert_missing(&mut prepared, &format!("src/App.{ext}"), || {
                    FALLBACK_APP.to_string()
                });
            }
        }
        Toolchain::ReactScripts => {
            insert_missing(&mut prepared, "public/index.html", || root_html(None));
            if !has_any(&prepared, &["src/index.js", "src/index.jsx", "src/index.tsx"]) {
                insert_missing(&mut prepared, "src/index.js", entry_point);
            }
            if !has_any(&prepared, &["src/App.js", "src/App.jsx", "src/App.tsx"]) {
                insert_missing(&mut prepared, "src/App.js", || FALLBACK_APP.to_string());
            }
        }
    }

    insert_missing(&mut prepared, "src/index.css", || BASE_CSS.to_string());
    prepared
}

/// Identifier and links of a created sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxLinks {
    pub sandbox_id: String,
    pub embed_url: String,
    pub edit_url: String,
}

impl SandboxLinks {
    pub fn new(site_url: &str, sandbox_id: &str) -> Self {
        let site = site_url.trim_end_matches('/');
        Self {
            sandbox_id: sandbox_id.to_string(),
            embed_url: format!(
                "{site}/embed/{sandbox_id}?fontsize=14&hidenavigation=1&theme=dark&view=preview&hidedevtools=1"
            ),
            edit_url: format!("{site}/s/{sandbox_id}"),
        }
    }
}

#[derive(Serialize)]
struct DefineRequest<'a> {
    files: &'a SandboxFiles,
}

#[derive(Deserialize)]
struct DefineResponse {
    sandbox_id: String,
}

pub struct SandboxClient {
    http: reqwest::Client,
    config: SandboxConfig,
}

impl SandboxClient {
    pub fn new(config: SandboxConfig) -> Result<Self, SandboxError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SandboxError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Prepare `files` and create a sandbox from them.
    pub async fn create(&self, files: &[GeneratedFile]) -> Result<SandboxLinks, SandboxError> {
        let prepared = prepare_files(files);
        tracing::info!(files = prepared.len(), "creating sandbox");

        let url = format!(
            "{}/sandboxes/define?json=1",
            self.config.api_base.trim_end_matches('/')
        );
        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .json(&DefineRequest { files: &prepared })
            .send()
            .await
            .map_err(|e| SandboxError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "sandbox creation failed");
            return Err(SandboxError::Api {
                status: status.as_u16(),
                body: truncate_chars(&body, ERROR_BODY_PREVIEW_CHARS).to_string(),
            });
        }

        let define: DefineResponse = response
            .json()
            .await
            .map_err(|e| SandboxError::InvalidResponse(e.to_string()))?;
        tracing::info!(sandbox_id = %define.sandbox_id, "sandbox created");
        Ok(SandboxLinks::new(&self.config.site_url, &define.sandbox_id))
    }
}
