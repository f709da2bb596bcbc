//! Environment variable loading and management.
//!
//! Recognized variables:
//! - `AGENTREG_LOG_LEVEL`
//! - `AGENTREG_DEFAULT_TIMEOUT_MS`
//! - `AGENTREG_SESSION_MAX_AGE_MS`

use std::env;
use std::path::Path;

use tracing::warn;

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<String>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to a .env file. Only an explicitly provided file is
    ///   loaded; variables already set in the process win.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    warn!(path = %path.display(), error = %e, "Failed to load .env file");
                }
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
        }
    }

    /// The .env file this loader was created with.
    pub fn env_file(&self) -> Option<&str> {
        self.env_file.as_deref()
    }

    /// Log level override.
    pub fn log_level(&self) -> Option<String> {
        env::var("AGENTREG_LOG_LEVEL").ok().filter(|v| !v.trim().is_empty())
    }

    /// Default agent timeout override.
    pub fn default_timeout_ms(&self) -> Option<u64> {
        parse_u64("AGENTREG_DEFAULT_TIMEOUT_MS")
    }

    /// Session max age override.
    pub fn session_max_age_ms(&self) -> Option<u64> {
        parse_u64("AGENTREG_SESSION_MAX_AGE_MS")
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

fn parse_u64(key: &str) -> Option<u64> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring non-numeric environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // One test touches the process environment so no two tests race on it.
    #[test]
    fn test_environment_overrides() {
        env::remove_var("AGENTREG_LOG_LEVEL");
        env::remove_var("AGENTREG_DEFAULT_TIMEOUT_MS");
        let env_loader = EnvironmentLoader::default();
        assert_eq!(env_loader.log_level(), None);
        assert_eq!(env_loader.default_timeout_ms(), None);

        env::set_var("AGENTREG_DEFAULT_TIMEOUT_MS", "1500");
        assert_eq!(env_loader.default_timeout_ms(), Some(1500));

        env::set_var("AGENTREG_DEFAULT_TIMEOUT_MS", "soon");
        assert_eq!(env_loader.default_timeout_ms(), None);
        env::remove_var("AGENTREG_DEFAULT_TIMEOUT_MS");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "AGENTREG_SESSION_MAX_AGE_MS=60000").unwrap();
        let env_loader = EnvironmentLoader::new(Some(file.path()));
        assert!(env_loader.env_file().is_some());
        assert_eq!(env_loader.session_max_age_ms(), Some(60_000));
        env::remove_var("AGENTREG_SESSION_MAX_AGE_MS");
    }
}
