//! Agent Registry (agentreg) - Tool and agent registries with orchestration
//!
//! agentreg keeps two catalogs and routes work across them:
//!
//! - **`tools`** - Tool definitions, parameter validation, guarded execution
//!   and per-tool usage statistics
//! - **`agents`** - Agent schemas with lifecycle hooks, per-session memory
//!   and cost tracking
//! - **`orchestration`** - Capability-based agent selection with utility
//!   fallback, session tracking and workflows
//!
//! Optional modules are feature-gated:
//!
//! - **`config`** - TOML configuration and environment overrides
//! - **`observability`** - Markdown activity log attached as a session observer
//! - **`templates`** - `{{ name }}` prompt templates
//! - **`cli`** - Terminal tables and the `agentreg` binary
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! agentreg = { version = "0.3", features = ["config"] }
//! # Or enable everything:
//! agentreg = { version = "0.3", features = ["all"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! use agentreg::prelude::*;
//! use async_trait::async_trait;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct Reviewer;
//!
//! #[async_trait]
//! impl AgentHandler for Reviewer {
//!     async fn execute(&self, ctx: &AgentContext) -> anyhow::Result<AgentResult> {
//!         Ok(AgentResult::ok(json!({ "reviewed": ctx.parameters.get("file") })))
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let orchestrator = RegistryOrchestrator::default();
//! orchestrator
//!     .register_agent(
//!         AgentSchema::new("reviewer", "Reviewer", AgentType::Specialist)
//!             .with_capability("code-review"),
//!         Arc::new(Reviewer),
//!     )
//!     .await
//!     .unwrap();
//!
//! let result = orchestrator
//!     .execute_task(OrchestrationRequest::new("code-review"), Some("alice"))
//!     .await;
//! assert!(result.success);
//! assert_eq!(result.metadata.agent_used.as_deref(), Some("reviewer"));
//! # });
//! ```

#![warn(missing_docs)]

/// Shared registry plumbing: errors, usage statistics, parameters
pub mod registry;

/// Tool registry
pub mod tools;

/// Agent registry
pub mod agents;

/// Registry orchestrator, sessions and workflows
pub mod orchestration;

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

/// Observability utilities (enabled with the `observability` feature)
#[cfg(feature = "observability")]
pub mod observability;

/// Prompt templates (enabled with the `templates` feature)
#[cfg(feature = "templates")]
pub mod templates;

/// CLI display utilities (enabled with the `cli` feature)
#[cfg(feature = "cli")]
pub mod cli;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::registry::{EntryKind, Parameters, RegistryError, RegistryResult, StatsStrategy};

    pub use crate::tools::{
        ParameterType, ToolCategory, ToolContext, ToolDefinition, ToolHandler, ToolParameter,
        ToolQuery, ToolRegistry, ToolResult,
    };

    pub use crate::agents::{
        AgentCapabilities, AgentContext, AgentHandler, AgentQuery, AgentRegistry, AgentResult,
        AgentSchema, AgentType, Priority,
    };

    pub use crate::orchestration::{
        OrchestrationRequest, OrchestrationResult, OrchestratorConfig, RegistryOrchestrator,
        SequentialWorkflow, SessionStatus, WorkflowRunner, WorkflowStep,
    };

    #[cfg(feature = "config")]
    pub use crate::config::{Configuration, ConfigurationLoader, EnvironmentLoader};

    #[cfg(feature = "observability")]
    pub use crate::observability::ActivityLog;

    #[cfg(feature = "templates")]
    pub use crate::templates::{InMemoryTemplates, TemplateProvider};
}
