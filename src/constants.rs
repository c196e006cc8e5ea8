//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! upstream URLs and size caps so a rename only requires changing this file.

/// Display name of the service (lowercase).
pub const APP_NAME: &str = "devforge";

/// Crate version baked in at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compilation target triple (set by `build.rs`).
pub const TARGET: &str = env!("TARGET");

/// User-Agent sent to GitHub and the sandbox API.
pub const USER_AGENT: &str = concat!("devforge/", env!("CARGO_PKG_VERSION"));

/// Local config filename (e.g. `devforge.toml` in the working directory).
pub const CONFIG_FILENAME: &str = "devforge.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "devforge";

// ── Upstream endpoints ──────────────────────────────────────────────

/// Generative Language API root (the model path is appended).
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model used for every tool.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com";

pub const SANDBOX_API_BASE: &str = "https://codesandbox.io/api/v1";
pub const SANDBOX_SITE: &str = "https://codesandbox.io";

// ── Limits ──────────────────────────────────────────────────────────

/// Number of characters of raw model text carried in a parse failure.
pub const DIAGNOSTIC_PREVIEW_CHARS: usize = 500;

/// Number of characters of an upstream error body carried in an error.
pub const ERROR_BODY_PREVIEW_CHARS: usize = 200;

// ── Environment variable names ──────────────────────────────────────

pub const ENV_HOST: &str = "DEVFORGE_HOST";
pub const ENV_PORT: &str = "DEVFORGE_PORT";
pub const ENV_MODEL: &str = "DEVFORGE_MODEL";
pub const ENV_API_KEY: &str = "DEVFORGE_API_KEY";
pub const ENV_PROVIDER_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_BASE_URL: &str = "DEVFORGE_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "DEVFORGE_TIMEOUT_SECS";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Truncate `text` to at most `max_chars` characters without splitting a
/// UTF-8 sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
