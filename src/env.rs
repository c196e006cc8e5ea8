//! Environment variable abstraction for testability.
//!
//! Production code uses [`Env::real()`] which delegates to [`std::env::var`].
//! Tests use [`Env::mock()`] backed by a `HashMap`, so config layering can be
//! exercised without touching the process environment.

use std::collections::HashMap;
use std::str::FromStr;

/// Environment variable reader.
#[derive(Clone, Debug, Default)]
pub struct Env {
    overrides: Option<HashMap<String, String>>,
}

impl Env {
    /// Create an `Env` that reads from the real process environment.
    pub fn real() -> Self {
        Self { overrides: None }
    }

    /// Create an `Env` backed by explicit key-value pairs.
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            overrides: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Look up an environment variable by name. Empty values count as unset.
    pub fn var(&self, name: &str) -> Option<String> {
        let value = match &self.overrides {
            Some(map) => map.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Look up and parse a variable.
    ///
    /// Returns `Some(Err(raw))` when the variable is set but does not parse,
    /// so callers can warn about the ignored value.
    pub fn parsed<T: FromStr>(&self, name: &str) -> Option<Result<T, String>> {
        self.var(name)
            .map(|raw| raw.trim().parse::<T>().map_err(|_| raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_env_reads_cargo_manifest_dir() {
        let env = Env::real();
        assert!(env.var("CARGO_MANIFEST_DIR").is_some());
    }

    #[test]
    fn mock_env_returns_set_values() {
        let env = Env::mock([("DEVFORGE_MODEL", "gemini-pro"), ("DEVFORGE_PORT", "8080")]);
        assert_eq!(env.var("DEVFORGE_MODEL").as_deref(), Some("gemini-pro"));
        assert_eq!(env.var("DEVFORGE_PORT").as_deref(), Some("8080"));
        assert!(env.var("NONEXISTENT").is_none());
    }

    #[test]
    fn empty_values_are_treated_as_unset() {
        let env = Env::mock([("GITHUB_TOKEN", "  ")]);
        assert!(env.var("GITHUB_TOKEN").is_none());
    }

    #[test]
    fn parsed_distinguishes_missing_and_invalid() {
        let env = Env::mock([("PORT", "3000"), ("BAD", "three")]);
        assert_eq!(env.parsed::<u16>("PORT"), Some(Ok(3000)));
        assert_eq!(env.parsed::<u16>("BAD"), Some(Err("three".to_string())));
        assert_eq!(env.parsed::<u16>("MISSING"), None);
    }
}
