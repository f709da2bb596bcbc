//! Normalized results returned by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bookkeeping attached to every orchestration result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    /// Session that produced the result.
    pub session_id: String,
    /// Agent that ran, if one was selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_used: Option<String>,
    /// Tools reported as used.
    #[serde(default)]
    pub tools_used: Vec<String>,
    /// When the result was produced.
    pub timestamp: DateTime<Utc>,
    /// Retry counter of the session.
    #[serde(default)]
    pub retries: u32,
    /// Whether a utility agent stood in for a capable one.
    #[serde(default)]
    pub fallback_used: bool,
}

impl ResultMetadata {
    /// Metadata for a session with no agent.
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            agent_used: None,
            tools_used: Vec::new(),
            timestamp: Utc::now(),
            retries: 0,
            fallback_used: false,
        }
    }
}

/// Outcome of `execute_task` or `execute_workflow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResult {
    /// Whether the task succeeded.
    pub success: bool,
    /// Result payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time of the whole call.
    pub execution_time_ms: u64,
    /// Cost reported by the agent, or zero.
    pub cost: f64,
    /// Session bookkeeping.
    pub metadata: ResultMetadata,
}

impl OrchestrationResult {
    /// A failed result with zero cost.
    pub fn failure(error: impl Into<String>, metadata: ResultMetadata) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            execution_time_ms: 0,
            cost: 0.0,
            metadata,
        }
    }
}
