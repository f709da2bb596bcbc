//! Configuration management.
//!
//! This module provides configuration loading through TOML files and
//! environment variable overrides via `.env` files.
//!
//! # Example
//!
//! ```no_run
//! use agentreg::config::{ConfigurationLoader, EnvironmentLoader};
//! use agentreg::orchestration::RegistryOrchestrator;
//! use std::path::Path;
//!
//! let env = EnvironmentLoader::new(None);
//!
//! let mut loader = ConfigurationLoader::new(Some(Path::new("config/agentreg.toml"))).unwrap();
//! loader.apply_environment(&env);
//!
//! let orchestrator = RegistryOrchestrator::from_config(loader.config.orchestrator_config());
//! println!("Catalog agents: {}", loader.config.agents.len());
//! ```

pub mod config;
pub mod environment;

// Re-export main types for convenience
pub use self::config::{Configuration, ConfigurationLoader, LoggingConfig, OrchestratorSection};
pub use self::environment::EnvironmentLoader;
