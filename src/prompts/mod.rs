//! Prompt construction for the three tools and the chat assistant.
//!
//! Everything here is a pure function of its inputs. Generation settings
//! live next to the prompts they belong to.

use serde_json::json;

use crate::config::LimitsConfig;
use crate::constants::truncate_chars;
use crate::models::architecture::catalog_labels;
use crate::models::{
    CanvasNode, Customizations, DocKind, FileDescriptor, NodeCategory, SourceFile, ToolContext,
    ToolKind,
};
use crate::providers::{FunctionDeclaration, GenerationConfig};

/// Low temperature keeps the review JSON stable.
pub const REVIEW_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.2,
    max_output_tokens: 4096,
    top_p: Some(0.8),
};

pub const CODE_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.3,
    max_output_tokens: 8192,
    top_p: Some(0.95),
};

pub const DOCS_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.5,
    max_output_tokens: 4096,
    top_p: None,
};

pub const CHAT_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.7,
    max_output_tokens: 1000,
    top_p: None,
};

const PROJECT_SKELETON: &str = r#"{
  "files": [
    {"path": "frontend/package.json", "content": "..."},
    {"path": "frontend/index.html", "content": "..."},
    {"path": "frontend/vite.config.ts", "content": "..."},
    {"path": "frontend/src/main.tsx", "content": "COMPLETE REACT ENTRY POINT"},
    {"path": "frontend/src/App.tsx", "content": "COMPLETE APP COMPONENT"},
    {"path": "frontend/src/index.css", "content": "TAILWIND CSS"},
    {"path": "frontend/tsconfig.json", "content": "..."},
    {"path": "backend/server.js", "content": "COMPLETE EXPRESS SERVER"},
    {"path": "backend/package.json", "content": "..."}
  ],
  "dependencies": {
    "frontend": {"react": "^18.2.0", "react-dom": "^18.2.0", "vite": "^4.3.9"},
    "backend": {"express": "^4.18.2", "cors": "^2.8.5"}
  },
  "setup_instructions": "npm install in both folders, then npm run dev"
}"#;

const REVIEW_SKELETON: &str = r#"{"issues":[{"id":"1","severity":"critical","category":"security","title":"SQL Injection","file":"app.js","line":25,"code_snippet":"db.query('SELECT * FROM users WHERE id=' + userId)","problem":"Direct SQL concatenation","impact":"Database compromise","fix":"db.query('SELECT * FROM users WHERE id=$1',[userId])","explanation":"Use parameterized queries"},{"id":"2","severity":"medium","category":"performance","title":"N+1 Query","file":"users.js","line":45,"code_snippet":"for(user of users){await getOrders(user.id)}","problem":"Multiple queries in loop","impact":"Slow performance","fix":"const orders=await getOrdersByUserIds(userIds)","explanation":"Batch queries"}],"summary":{"critical":1,"medium":1,"low":0}}"#;

fn stack_line(nodes: &[CanvasNode], category: NodeCategory) -> String {
    let labels: Vec<&str> = nodes
        .iter()
        .filter(|n| n.category() == category)
        .map(|n| n.data.label.as_str())
        .collect();
    if labels.is_empty() {
        "none".to_string()
    } else {
        labels.join(", ")
    }
}

/// Prompt for the architecture code generator.
pub fn architecture_prompt(nodes: &[CanvasNode], customizations: &Customizations) -> String {
    let project_name = customizations.project_name();
    let requirements = customizations
        .user_prompt
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or("Simple starter app");
    let design = customizations
        .design
        .as_ref()
        .and_then(|d| serde_json::to_string(d).ok())
        .unwrap_or_else(|| "Clean modern UI".to_string());

    let mut prompt = format!(
        "Generate a complete {project_name} application. \
        Return ONLY valid JSON (no markdown, no explanations).\n\n\
        CRITICAL: All frontend files MUST have \"frontend/\" prefix, \
        all backend files MUST have \"backend/\" prefix.\n\n\
        REQUIRED FILE STRUCTURE:\n{PROJECT_SKELETON}\n\n"
    );

    prompt.push_str("SELECTED STACK:\n");
    for (title, category) in [
        ("Frontend", NodeCategory::Frontend),
        ("Backend", NodeCategory::Backend),
        ("Database", NodeCategory::Database),
        ("Services", NodeCategory::Service),
    ] {
        prompt.push_str(&format!("- {title}: {}\n", stack_line(nodes, category)));
    }

    prompt.push_str(
        "\nFRONTEND REQUIREMENTS:\n\
        - Use Vite + React + TypeScript\n\
        - frontend/src/main.tsx MUST import and render App\n\
        - frontend/index.html MUST have <div id=\"root\"></div>\n\
        - frontend/package.json MUST have \"type\": \"module\" and Vite scripts\n\n\
        BACKEND REQUIREMENTS:\n\
        - Use Express + Node.js\n\
        - backend/server.js MUST start on port 3000\n\
        - Include CORS middleware\n\n",
    );

    if let Some(features) = customizations.features.as_ref().filter(|f| !f.is_empty()) {
        prompt.push_str("FEATURES:\n");
        for feature in features {
            prompt.push_str(&format!("- {feature}\n"));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "USER REQUIREMENTS:\n{requirements}\n\n\
        DESIGN:\n{design}\n\n\
        Generate ALL files with COMPLETE working code. Keep concise but functional."
    ));
    prompt
}

/// Prompt for the code reviewer. Only the first files and the head of each
/// file are included, per `limits`.
pub fn review_prompt(files: &[SourceFile], limits: &LimitsConfig) -> String {
    let mut prompt = String::from(
        "Analyze code for security and quality issues. \
        Return ONLY JSON (no markdown, no backticks).\n\nCODE FILES:\n",
    );

    for file in files.iter().take(limits.review_max_files) {
        prompt.push_str(&format!(
            "\nFILE: {}\n{}\n",
            file.path,
            truncate_chars(&file.content, limits.review_snippet_chars)
        ));
    }

    prompt.push_str(&format!(
        "\nFind 3-5 REAL issues. Return this EXACT JSON structure:\n\n{REVIEW_SKELETON}\n\n\
        Focus on:\n\
        - SQL injection (string concatenation in queries)\n\
        - XSS (unescaped user input)\n\
        - Hardcoded secrets\n\
        - Missing error handling\n\
        - Performance issues\n\n\
        Return ONLY the JSON object."
    ));
    prompt
}

/// Prompt for the documentation generator.
pub fn docs_prompt(
    files: &[FileDescriptor],
    kinds: &[DocKind],
    style: Option<&str>,
    limits: &LimitsConfig,
) -> String {
    let listed: Vec<String> = files
        .iter()
        .take(limits.docs_max_listed_files)
        .map(|f| format!("- {}", f.display_name()))
        .collect();
    let keys: Vec<&str> = kinds.iter().map(|k| k.key()).collect();
    let skeleton: Vec<String> = kinds
        .iter()
        .map(|k| format!("  \"{}\": \"{}\"", k.key(), k.example()))
        .collect();
    let style = style.filter(|s| !s.trim().is_empty()).unwrap_or("technical");

    format!(
        "You are a technical documentation generator.\n\n\
        FILES TO DOCUMENT:\n{}\n(Total: {} files)\n\n\
        STYLE: {style}\n\n\
        REQUIRED OUTPUT:\n\
        Generate the following documentation sections in a single valid JSON object.\n\
        Keys: {}\n\n\
        INSTRUCTIONS:\n\
        1. Return ONLY the JSON object.\n\
        2. Do NOT use markdown code blocks (no ```json).\n\
        3. Escape all quotes and control characters properly within the JSON strings.\n\
        4. Keep the content meaningful but concise to avoid token limits.\n\n\
        JSON STRUCTURE:\n{{\n{}\n}}",
        listed.join("\n"),
        files.len(),
        keys.join(", "),
        skeleton.join(",\n"),
    )
}

/// System prompt sent as the first user turn of a chat.
pub fn chat_system_prompt(context: &ToolContext) -> String {
    let base = format!(
        "You are DevForge AI assistant helping with {tool}.\n\n\
        CURRENT STATE:\n\
        - Nodes on canvas: {count}\n\
        - Active tool: {tool}\n",
        tool = context.tool,
        count = context.nodes.len(),
    );

    let guidance = match context.kind() {
        ToolKind::ArchitectureBuilder => architecture_guidance(),
        ToolKind::CodeReviewer => "\nProvide helpful explanations about:\n\
            - Security vulnerabilities and how to fix them\n\
            - Performance optimization techniques\n\
            - Code quality best practices\n\
            - Alternative solutions\n\n\
            Be clear, educational, and actionable.\n"
            .to_string(),
        ToolKind::DocsGenerator => "\nHelp improve documentation by:\n\
            - Suggesting missing sections\n\
            - Simplifying complex explanations\n\
            - Adding code examples\n\
            - Clarifying technical concepts\n\n\
            Be helpful and constructive.\n"
            .to_string(),
        ToolKind::Other(_) => "\nProvide helpful, conversational assistance.".to_string(),
    };

    base + &guidance
}

fn quoted_labels(category: NodeCategory) -> String {
    catalog_labels(category)
        .iter()
        .map(|l| format!("\"{l}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn architecture_guidance() -> String {
    format!(
        "\nYOU MUST USE FUNCTIONS TO MODIFY THE ARCHITECTURE:\n\n\
        **Available Functions:**\n\
        1. add_node(category, label) - Adds technology to canvas\n\
        2. remove_node(label) - Removes technology from canvas\n\
        3. update_customization(projectName, description, features, design) - Updates project settings\n\n\
        **Available Technologies:**\n\
        Frontend: {}\n\
        Backend: {}\n\
        Database: {}\n\
        Service: {}\n\n\
        **CRITICAL RULES:**\n\
        - ALWAYS use exact names listed above (case-sensitive)\n\
        - When user says \"Add Stripe\", call add_node({{ category: \"service\", label: \"Stripe Payments\" }})\n\
        - When user says \"Add PostgreSQL\", call add_node({{ category: \"database\", label: \"PostgreSQL\" }})\n\
        - After calling function, respond with a short confirmation like \"✅ Added Stripe Payments to your architecture!\"\n\n\
        **Examples:**\n\
        User: \"I want dark theme with purple gradient\"\n\
        → Call update_customization({{ design: {{ theme: \"dark\", colors: [\"#667eea\", \"#764ba2\", \"#f093fb\"] }} }})\n\
        → Respond: \"✅ Updated to dark theme with purple-pink gradient colors.\"\n\n\
        User: \"Remove MongoDB\"\n\
        → Call remove_node({{ label: \"MongoDB\" }})\n\
        → Respond: \"✅ Removed MongoDB from the architecture.\"\n\n\
        BE CONCISE. Always use functions when user requests changes.\n",
        quoted_labels(NodeCategory::Frontend),
        quoted_labels(NodeCategory::Backend),
        quoted_labels(NodeCategory::Database),
        quoted_labels(NodeCategory::Service),
    )
}

/// Functions offered to the model while the architecture builder is open.
pub fn architecture_functions() -> Vec<FunctionDeclaration> {
    vec![
        FunctionDeclaration {
            name: "add_node".to_string(),
            description: "Add a technology node to the architecture canvas".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "enum": ["frontend", "backend", "database", "service"],
                        "description": "The category of the technology node"
                    },
                    "label": {
                        "type": "string",
                        "description": "EXACT technology name from available list"
                    }
                },
                "required": ["category", "label"]
            }),
        },
        FunctionDeclaration {
            name: "remove_node".to_string(),
            description: "Remove a technology node from the canvas".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "label": {
                        "type": "string",
                        "description": "Exact technology name to remove"
                    }
                },
                "required": ["label"]
            }),
        },
        FunctionDeclaration {
            name: "update_customization".to_string(),
            description: "Update project customizations like features and design".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "projectName": {"type": "string"},
                    "description": {"type": "string"},
                    "features": {"type": "array", "items": {"type": "string"}},
                    "design": {
                        "type": "object",
                        "properties": {
                            "theme": {"type": "string"},
                            "colors": {"type": "array", "items": {"type": "string"}},
                            "buttonStyle": {"type": "string"},
                            "layout": {"type": "string"}
                        }
                    }
                }
            }),
        },
    ]
}
