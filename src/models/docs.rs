//! Documentation generator types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A kind of document the generator can produce.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum DocKind {
    #[serde(rename = "readme")]
    #[strum(serialize = "readme")]
    Readme,
    #[serde(rename = "apiDocs")]
    #[strum(serialize = "apiDocs")]
    ApiDocs,
    #[serde(rename = "deployment")]
    #[strum(serialize = "deployment")]
    Deployment,
    #[serde(rename = "contributing")]
    #[strum(serialize = "contributing")]
    Contributing,
}

impl DocKind {
    /// JSON key used for this kind in requests and model output.
    pub fn key(self) -> &'static str {
        self.into()
    }

    /// Skeleton value shown to the model for this kind.
    pub fn example(self) -> &'static str {
        match self {
            DocKind::Readme => "# Project Title\\n\\nDescription...",
            DocKind::ApiDocs => "# API Reference\\n\\n...",
            DocKind::Deployment => "# Deployment\\n\\n...",
            DocKind::Contributing => "# Contributing\\n\\n...",
        }
    }
}

/// A file reference sent by the docs UI. Either `name` or `path` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl FileDescriptor {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or("(unnamed)")
    }
}
