//! Source acquisition: public GitHub repositories and direct uploads.

pub mod github;
pub mod upload;

use thiserror::Error;

pub use github::{GithubClient, RepoRef, TreeEntry, parse_repo_url};
pub use upload::{Upload, validate_uploads};

/// Errors while acquiring source files.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid GitHub URL format. Expected: https://github.com/username/repo")]
    InvalidUrl(String),

    #[error("Repository not found or is private. Make sure it's a public repository.")]
    RepositoryNotFound,

    #[error("GitHub API error: {0}")]
    Api(u16),

    #[error("GitHub request failed: {0}")]
    Transport(String),

    #[error("No code files found in repository")]
    NoFiles,

    #[error("File \"{name}\" exceeds {limit_mib}MB limit")]
    FileTooLarge { name: String, limit_mib: usize },

    #[error("Total size exceeds {limit_mib}MB limit")]
    TotalTooLarge { limit_mib: usize },
}

impl SourceError {
    /// Size violations are reported separately from other input problems.
    pub fn is_size_limit(&self) -> bool {
        matches!(
            self,
            SourceError::FileTooLarge { .. } | SourceError::TotalTooLarge { .. }
        )
    }
}

/// Extensions sent to the code reviewer.
pub const CODE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "py", "go", "java", "cpp", "c", "h", "cs", "rb", "php", "swift",
    "kt", "rs", "scala", "sh", "sql",
];

/// Extensions listed for the docs generator.
pub const DOC_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "py", "go", "java", "cpp", "c", "h", "cs", "rb", "php", "md",
    "json",
];

/// Build output, dependency and VCS directories never worth reviewing.
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules/",
    "dist/",
    "build/",
    ".next/",
    "coverage/",
    ".git/",
    "vendor/",
    "__pycache__/",
    ".pytest_cache/",
    "target/",
    "bin/",
    "obj/",
    "out/",
    "pkg/",
];

/// Path filter: an extension allow-list plus a directory deny-list.
#[derive(Debug, Clone, Copy)]
pub struct FileFilter {
    extensions: &'static [&'static str],
    ignored: &'static [&'static str],
}

impl FileFilter {
    pub fn code() -> Self {
        Self {
            extensions: CODE_EXTENSIONS,
            ignored: IGNORED_DIRS,
        }
    }

    /// The docs listing only filters by extension.
    pub fn docs() -> Self {
        Self {
            extensions: DOC_EXTENSIONS,
            ignored: &[],
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let has_extension = path
            .rsplit_once('.')
            .is_some_and(|(_, ext)| self.extensions.contains(&ext));
        has_extension && !self.ignored.iter().any(|dir| path.contains(dir))
    }
}
