//! Observability utilities for the registries and the orchestrator.
//!
//! Runtime diagnostics go through `tracing`; this module adds a persistent
//! markdown activity log that can be attached to an orchestrator as a
//! session observer.
//!
//! # Example
//!
//! ```no_run
//! use agentreg::observability::ActivityLog;
//! use agentreg::orchestration::RegistryOrchestrator;
//! use std::sync::Arc;
//!
//! let log = Arc::new(ActivityLog::new(None, Some("DEBUG")).unwrap());
//! let orchestrator = RegistryOrchestrator::default();
//! orchestrator.add_observer(log.clone());
//!
//! log.log_statistics(&orchestrator.get_system_statistics()).unwrap();
//! ```

pub mod activity;

// Re-export main types for convenience
pub use activity::{ActivityLevel, ActivityLog};
