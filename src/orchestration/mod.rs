//! Registry orchestration - task routing across the tool and agent registries
//!
//! The orchestrator sits on top of a [`ToolRegistry`](crate::tools::ToolRegistry)
//! and an [`AgentRegistry`](crate::agents::AgentRegistry):
//! - Agent selection by capability, preferred type and exclusions, with a
//!   utility-agent fallback
//! - Session tracking (`initializing → executing → completed | failed`)
//! - Normalized results with timing, cost and bookkeeping metadata
//! - Named workflows run through [`WorkflowRunner`] implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agentreg::orchestration::{OrchestrationRequest, RegistryOrchestrator};
//!
//! let orchestrator = RegistryOrchestrator::default();
//! orchestrator.register_agent(schema, Arc::new(Reviewer)).await?;
//!
//! let result = orchestrator
//!     .execute_task(OrchestrationRequest::new("code-review"), Some("alice"))
//!     .await;
//! println!("{} via {:?}", result.success, result.metadata.agent_used);
//! ```

mod orchestrator;
mod request;
mod result;
mod selection;
mod session;
mod statistics;
pub mod workflow;

pub use orchestrator::{
    OrchestratorConfig, RegistryOrchestrator, DEFAULT_AGENT_TIMEOUT_MS, DEFAULT_SESSION_MAX_AGE_MS,
};
pub use request::{AgentPreferences, ExecutionOptions, OrchestrationRequest};
pub use result::{OrchestrationResult, ResultMetadata};
pub use session::{OrchestrationSession, SessionObserver, SessionStatus};
pub use statistics::{SessionCounts, SystemStatistics};
pub use workflow::{SequentialWorkflow, WorkflowOutcome, WorkflowRunner, WorkflowStep};
