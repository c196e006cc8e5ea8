//! Architecture canvas types and the generated project they produce.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Category of a technology node on the canvas.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NodeCategory {
    Frontend,
    Backend,
    Database,
    Service,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Payload carried by a canvas node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    pub icon: String,
    pub category: NodeCategory,
    /// Catalog id of the technology (e.g. `postgresql`).
    pub node_id: String,
}

/// A technology node placed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
}

impl CanvasNode {
    pub fn category(&self) -> NodeCategory {
        self.data.category
    }
}

/// A directed connector between two canvas nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub animated: bool,
}

/// Visual design preferences for the generated app.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Design {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typography: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<String>,
}

impl Design {
    /// Overlay every field set in `updates`.
    pub fn merge(&mut self, updates: Design) {
        if updates.theme.is_some() {
            self.theme = updates.theme;
        }
        if updates.colors.is_some() {
            self.colors = updates.colors;
        }
        if updates.button_style.is_some() {
            self.button_style = updates.button_style;
        }
        if updates.layout.is_some() {
            self.layout = updates.layout;
        }
        if updates.typography.is_some() {
            self.typography = updates.typography;
        }
        if updates.spacing.is_some() {
            self.spacing = updates.spacing;
        }
    }
}

/// Project-level customizations collected from the user or the chat assistant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Customizations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design: Option<Design>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_prompt: Option<String>,
}

impl Customizations {
    /// Shallow merge: set fields replace, `design` is merged one level deep.
    pub fn merge(&mut self, updates: Customizations) {
        if updates.project_name.is_some() {
            self.project_name = updates.project_name;
        }
        if updates.description.is_some() {
            self.description = updates.description;
        }
        if updates.features.is_some() {
            self.features = updates.features;
        }
        if updates.user_prompt.is_some() {
            self.user_prompt = updates.user_prompt;
        }
        if let Some(design) = updates.design {
            self.design.get_or_insert_with(Design::default).merge(design);
        }
    }

    pub fn project_name(&self) -> &str {
        self.project_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("MyApp")
    }
}

/// A single generated source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// Package manifests for both halves of the generated app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependencies {
    pub frontend: IndexMap<String, String>,
    pub backend: IndexMap<String, String>,
}

impl Dependencies {
    /// Manifest used when the model omits one.
    pub fn starter() -> Self {
        let pairs = |items: &[(&str, &str)]| {
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<IndexMap<_, _>>()
        };
        Self {
            frontend: pairs(&[
                ("react", "^18.2.0"),
                ("react-dom", "^18.2.0"),
                ("react-router-dom", "^6.20.0"),
                ("axios", "^1.6.2"),
                ("tailwindcss", "^3.4.0"),
                ("concurrently", "^8.2.2"),
            ]),
            backend: pairs(&[
                ("express", "^4.18.2"),
                ("cors", "^2.8.5"),
                ("better-sqlite3", "^9.2.2"),
            ]),
        }
    }
}

/// Setup text used when the model omits one.
pub const DEFAULT_SETUP_INSTRUCTIONS: &str =
    "# Setup\n\n1. npm install\n2. npm run dev\n3. Open http://localhost:5173";

/// The normalized output of the architecture generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedProject {
    pub files: Vec<GeneratedFile>,
    pub dependencies: Dependencies,
    pub setup_instructions: String,
}

/// An entry in the fixed technology palette.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub category: NodeCategory,
    pub label: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

macro_rules! entry {
    ($id:literal, $cat:ident, $label:literal, $icon:literal, $desc:literal) => {
        CatalogEntry {
            id: $id,
            category: NodeCategory::$cat,
            label: $label,
            icon: $icon,
            description: $desc,
        }
    };
}

/// Technologies that can be placed on the canvas.
pub const CATALOG: &[CatalogEntry] = &[
    entry!("react", Frontend, "React", "⚛️", "Modern UI with hooks"),
    entry!("nextjs", Frontend, "Next.js", "▲", "React with SSR/SSG"),
    entry!("vue", Frontend, "Vue", "🟢", "Progressive framework"),
    entry!("angular", Frontend, "Angular", "🔴", "Full-featured framework"),
    entry!("node-express", Backend, "Node.js + Express", "🟢", "Fast JavaScript API"),
    entry!("python-fastapi", Backend, "Python + FastAPI", "🐍", "Modern Python API"),
    entry!("go-gin", Backend, "Go + Gin", "🔵", "High-performance API"),
    entry!("node-nestjs", Backend, "Node.js + NestJS", "🔴", "Enterprise TypeScript"),
    entry!("postgresql", Database, "PostgreSQL", "🐘", "Relational database"),
    entry!("mongodb", Database, "MongoDB", "🍃", "NoSQL database"),
    entry!("redis", Database, "Redis", "🔴", "In-memory cache"),
    entry!("mysql", Database, "MySQL", "🐬", "Popular relational DB"),
    entry!("jwt-auth", Service, "JWT Auth", "🔐", "Token authentication"),
    entry!("stripe", Service, "Stripe Payments", "💳", "Payment processing"),
    entry!("aws-s3", Service, "AWS S3 Storage", "☁️", "File storage"),
];

/// Catalog labels of one category, in palette order.
pub fn catalog_labels(category: NodeCategory) -> Vec<&'static str> {
    CATALOG
        .iter()
        .filter(|e| e.category == category)
        .map(|e| e.label)
        .collect()
}

/// Advisory validation of a canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureCheck {
    pub valid: bool,
    pub errors: Vec<String>,
}

fn count(nodes: &[CanvasNode], category: NodeCategory) -> usize {
    nodes.iter().filter(|n| n.category() == category).count()
}

/// Check a canvas against the palette rules shown to the user.
pub fn check_architecture(nodes: &[CanvasNode]) -> ArchitectureCheck {
    let mut errors = Vec::new();

    match count(nodes, NodeCategory::Frontend) {
        0 => errors.push("Add 1 frontend framework".to_string()),
        1 => {}
        _ => errors.push("Remove extra frontends (max 1)".to_string()),
    }
    match count(nodes, NodeCategory::Backend) {
        0 => errors.push("Add 1 backend framework".to_string()),
        1 => {}
        _ => errors.push("Remove extra backends (max 1)".to_string()),
    }
    match count(nodes, NodeCategory::Database) {
        0 => errors.push("Add at least 1 database".to_string()),
        1 | 2 => {}
        _ => errors.push("Remove extra databases (max 2)".to_string()),
    }
    if count(nodes, NodeCategory::Service) > 3 {
        errors.push("Remove extra services (max 3)".to_string());
    }

    ArchitectureCheck {
        valid: errors.is_empty() && nodes.len() >= 3,
        errors,
    }
}

/// The rule enforced before code generation: one frontend, one backend,
/// at least one database.
pub fn ready_for_generation(nodes: &[CanvasNode]) -> bool {
    count(nodes, NodeCategory::Frontend) == 1
        && count(nodes, NodeCategory::Backend) == 1
        && count(nodes, NodeCategory::Database) >= 1
}

#[cfg(test)]
pub(crate) fn test_node(id: &str, category: NodeCategory, y: f64) -> CanvasNode {
    CanvasNode {
        id: id.to_string(),
        node_type: Some("custom".to_string()),
        position: Position { x: 0.0, y },
        data: NodeData {
            label: id.to_string(),
            icon: String::new(),
            category,
            node_id: id.to_string(),
        },
    }
}
