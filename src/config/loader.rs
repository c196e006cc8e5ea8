//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags (`serve --host/--port`)
//! 2. Environment variables
//! 3. `devforge.toml` in the working directory
//! 4. `~/.config/devforge/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::constants;
use crate::env::Env;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub limits: LimitsConfig,
    pub github: GithubConfig,
    pub sandbox: SandboxConfig,
    pub sessions: SessionsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a request body; sized to admit the aggregate upload cap.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_body_bytes: 60 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upstream model configuration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    /// Hard wall-clock limit on a single upstream call.
    pub timeout_secs: u64,
    /// Total attempts (first call included) when rate limited.
    pub max_attempts: u32,
    pub initial_backoff_secs: u64,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("initial_backoff_secs", &self.initial_backoff_secs)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: constants::DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: constants::GEMINI_API_BASE.to_string(),
            timeout_secs: 120,
            max_attempts: 3,
            initial_backoff_secs: 2,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_secs(self.initial_backoff_secs)
    }
}

/// Size caps applied to user input before any upstream call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_file_bytes: usize,
    pub max_total_bytes: usize,
    /// Uploaded file contents are truncated to this many characters.
    pub upload_content_chars: usize,
    /// Number of files included in a review prompt.
    pub review_max_files: usize,
    /// Characters of each file included in a review prompt.
    pub review_snippet_chars: usize,
    /// Number of file names listed in a docs prompt.
    pub docs_max_listed_files: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
            max_total_bytes: 50 * 1024 * 1024,
            upload_content_chars: 30_000,
            review_max_files: 5,
            review_snippet_chars: 1_000,
            docs_max_listed_files: 50,
        }
    }
}

/// GitHub source acquisition configuration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    pub raw_base: String,
    pub token: Option<String>,
    pub max_files: usize,
    /// Number of raw-content fetches awaited together.
    pub batch_size: usize,
    pub max_file_chars: usize,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_base", &self.api_base)
            .field("raw_base", &self.raw_base)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("max_files", &self.max_files)
            .field("batch_size", &self.batch_size)
            .field("max_file_chars", &self.max_file_chars)
            .finish()
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: constants::GITHUB_API_BASE.to_string(),
            raw_base: constants::GITHUB_RAW_BASE.to_string(),
            token: None,
            max_files: 100,
            batch_size: 10,
            max_file_chars: 50_000,
        }
    }
}

/// Sandbox preview configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub api_base: String,
    /// Site root used to build embed and edit links.
    pub site_url: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            api_base: constants::SANDBOX_API_BASE.to_string(),
            site_url: constants::SANDBOX_SITE.to_string(),
        }
    }
}

/// Bounds on the in-memory session store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    pub max_sessions: u64,
    /// A session untouched for this long is evicted.
    pub idle_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_sessions: 10_000,
            idle_secs: 60 * 60,
        }
    }
}

impl SessionsConfig {
    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, the working-directory config, then applies
    /// environment variable overrides.
    pub fn load(workdir: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        if let Some(dir) = workdir {
            let local_path = dir.join(constants::CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        config.apply_env_vars(env);

        Ok(config)
    }

    /// Load a config from a specific file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    fn merge(&mut self, other: Config) {
        let server = ServerConfig::default();
        if other.server.host != server.host {
            self.server.host = other.server.host;
        }
        if other.server.port != server.port {
            self.server.port = other.server.port;
        }
        if other.server.max_body_bytes != server.max_body_bytes {
            self.server.max_body_bytes = other.server.max_body_bytes;
        }

        let provider = ProviderConfig::default();
        if other.provider.model != provider.model {
            self.provider.model = other.provider.model;
        }
        if other.provider.api_key.is_some() {
            self.provider.api_key = other.provider.api_key;
        }
        if other.provider.base_url != provider.base_url {
            self.provider.base_url = other.provider.base_url;
        }
        if other.provider.timeout_secs != provider.timeout_secs {
            self.provider.timeout_secs = other.provider.timeout_secs;
        }
        if other.provider.max_attempts != provider.max_attempts {
            self.provider.max_attempts = other.provider.max_attempts;
        }
        if other.provider.initial_backoff_secs != provider.initial_backoff_secs {
            self.provider.initial_backoff_secs = other.provider.initial_backoff_secs;
        }

        let limits = LimitsConfig::default();
        if other.limits.max_file_bytes != limits.max_file_bytes {
            self.limits.max_file_bytes = other.limits.max_file_bytes;
        }
        if other.limits.max_total_bytes != limits.max_total_bytes {
            self.limits.max_total_bytes = other.limits.max_total_bytes;
        }
        if other.limits.upload_content_chars != limits.upload_content_chars {
            self.limits.upload_content_chars = other.limits.upload_content_chars;
        }
        if other.limits.review_max_files != limits.review_max_files {
            self.limits.review_max_files = other.limits.review_max_files;
        }
        if other.limits.review_snippet_chars != limits.review_snippet_chars {
            self.limits.review_snippet_chars = other.limits.review_snippet_chars;
        }
        if other.limits.docs_max_listed_files != limits.docs_max_listed_files {
            self.limits.docs_max_listed_files = other.limits.docs_max_listed_files;
        }

        let github = GithubConfig::default();
        if other.github.api_base != github.api_base {
            self.github.api_base = other.github.api_base;
        }
        if other.github.raw_base != github.raw_base {
            self.github.raw_base = other.github.raw_base;
        }
        if other.github.token.is_some() {
            self.github.token = other.github.token;
        }
        if other.github.max_files != github.max_files {
            self.github.max_files = other.github.max_files;
        }
        if other.github.batch_size != github.batch_size {
            self.github.batch_size = other.github.batch_size;
        }
        if other.github.max_file_chars != github.max_file_chars {
            self.github.max_file_chars = other.github.max_file_chars;
        }

        let sandbox = SandboxConfig::default();
        if other.sandbox.api_base != sandbox.api_base {
            self.sandbox.api_base = other.sandbox.api_base;
        }
        if other.sandbox.site_url != sandbox.site_url {
            self.sandbox.site_url = other.sandbox.site_url;
        }

        let sessions = SessionsConfig::default();
        if other.sessions.max_sessions != sessions.max_sessions {
            self.sessions.max_sessions = other.sessions.max_sessions;
        }
        if other.sessions.idle_secs != sessions.idle_secs {
            self.sessions.idle_secs = other.sessions.idle_secs;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Some(host) = env.var(constants::ENV_HOST) {
            self.server.host = host;
        }
        match env.parsed::<u16>(constants::ENV_PORT) {
            Some(Ok(port)) => self.server.port = port,
            Some(Err(raw)) => {
                tracing::warn!("ignoring invalid {} value: {raw}", constants::ENV_PORT)
            }
            None => {}
        }
        if let Some(model) = env.var(constants::ENV_MODEL) {
            self.provider.model = model;
        }
        if let Some(base_url) = env.var(constants::ENV_BASE_URL) {
            self.provider.base_url = base_url;
        }
        match env.parsed::<u64>(constants::ENV_TIMEOUT_SECS) {
            Some(Ok(secs)) if secs > 0 => self.provider.timeout_secs = secs,
            Some(_) => tracing::warn!(
                "ignoring invalid {} value",
                constants::ENV_TIMEOUT_SECS
            ),
            None => {}
        }

        let api_key = env
            .var(constants::ENV_API_KEY)
            .or_else(|| env.var(constants::ENV_PROVIDER_API_KEY));
        if api_key.is_some() {
            self.provider.api_key = api_key;
        }

        if let Some(token) = env.var(constants::ENV_GITHUB_TOKEN) {
            self.github.token = Some(token);
        }
    }
}
