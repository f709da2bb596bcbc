//! TOML configuration parsing and management.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::EnvironmentLoader;
use crate::agents::{AgentSchema, Priority};
use crate::orchestration::{OrchestratorConfig, DEFAULT_AGENT_TIMEOUT_MS, DEFAULT_SESSION_MAX_AGE_MS};
use crate::registry::StatsStrategy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Orchestrator settings.
    #[serde(default)]
    pub orchestrator: OrchestratorSection,
    /// Log destination and level.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Agent catalog, registered by the CLI.
    #[serde(default)]
    pub agents: Vec<AgentSchema>,
}

impl Configuration {
    /// Orchestrator settings derived from the `[orchestrator]` section.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let section = &self.orchestrator;
        OrchestratorConfig {
            default_timeout_ms: section.default_timeout_ms,
            default_priority: section.default_priority,
            report_fallback_usage: section.report_fallback_usage,
            session_max_age_ms: section.session_max_age_ms,
            stats_strategy: section.stats_strategy,
        }
    }
}

/// `[orchestrator]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSection {
    /// Advisory agent timeout when a request sets none.
    pub default_timeout_ms: u64,
    /// Agent priority when a request sets none.
    pub default_priority: Priority,
    /// Report the fallback flag truthfully.
    pub report_fallback_usage: bool,
    /// Age after which finished sessions are cleaned up.
    pub session_max_age_ms: u64,
    /// `approximate` or `exact`.
    pub stats_strategy: StatsStrategy,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_AGENT_TIMEOUT_MS,
            default_priority: Priority::Medium,
            report_fallback_usage: false,
            session_max_age_ms: DEFAULT_SESSION_MAX_AGE_MS,
            stats_strategy: StatsStrategy::Approximate,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Markdown activity log path.
    pub log_file: String,
    /// Minimum level, e.g. `INFO`.
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: std::env::temp_dir()
                .join("agentreg")
                .join(format!(
                    "agentreg_{}_{}.md",
                    Utc::now().timestamp_millis(),
                    std::process::id()
                ))
                .to_string_lossy()
                .to_string(),
            log_level: "INFO".to_string(),
        }
    }
}

/// Loads and manages TOML configuration.
#[derive(Debug)]
pub struct ConfigurationLoader {
    /// Path the configuration was (or would have been) read from.
    pub config_path: PathBuf,
    /// The loaded configuration.
    pub config: Configuration,
}

impl ConfigurationLoader {
    /// Initialize configuration loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None, `config/agentreg.toml`
    ///   is tried; a missing file yields the default configuration.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("config/agentreg.toml"));

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            Configuration::default()
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Create a configuration loader from a pre-parsed Configuration.
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config_path: PathBuf::from("config/agentreg.toml"),
            config,
        }
    }

    /// Load configuration from TOML file.
    fn load_config(path: &Path) -> Result<Configuration> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Configuration = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?;

        for schema in &config.agents {
            schema
                .validate()
                .with_context(|| format!("Invalid agent in config: {}", path.display()))?;
        }

        Ok(config)
    }

    /// Apply environment overrides on top of the loaded file.
    pub fn apply_environment(&mut self, env: &EnvironmentLoader) {
        if let Some(level) = env.log_level() {
            self.config.logging.log_level = level;
        }
        if let Some(timeout) = env.default_timeout_ms() {
            self.config.orchestrator.default_timeout_ms = timeout;
        }
        if let Some(max_age) = env.session_max_age_ms() {
            self.config.orchestrator.session_max_age_ms = max_age;
        }
    }

    /// Get configuration value by dot-notation key.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match key {
            "orchestrator.default_priority" => {
                Some(self.config.orchestrator.default_priority.to_string())
            }
            "orchestrator.stats_strategy" => Some(
                match self.config.orchestrator.stats_strategy {
                    StatsStrategy::Approximate => "approximate",
                    StatsStrategy::Exact => "exact",
                }
                .to_string(),
            ),
            "logging.log_file" => Some(self.config.logging.log_file.clone()),
            "logging.log_level" => Some(self.config.logging.log_level.clone()),
            _ => None,
        }
    }

    /// Get numeric configuration value.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match key {
            "orchestrator.default_timeout_ms" => Some(self.config.orchestrator.default_timeout_ms),
            "orchestrator.session_max_age_ms" => Some(self.config.orchestrator.session_max_age_ms),
            _ => None,
        }
    }

    /// Get boolean configuration value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match key {
            "orchestrator.report_fallback_usage" => {
                Some(self.config.orchestrator.report_fallback_usage)
            }
            _ => None,
        }
    }
}
