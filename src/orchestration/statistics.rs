//! System-wide statistics.

use serde::Serialize;

use crate::agents::AgentRegistryStatistics;
use crate::tools::ToolRegistryStatistics;

/// Session counts by state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCounts {
    /// Sessions not yet finished.
    pub active: usize,
    /// Sessions that completed.
    pub completed: usize,
    /// Sessions that failed.
    pub failed: usize,
    /// All tracked sessions.
    pub total: usize,
}

/// Snapshot of both registries and the session table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatistics {
    /// Tool registry statistics.
    pub tools: ToolRegistryStatistics,
    /// Agent registry statistics.
    pub agents: AgentRegistryStatistics,
    /// Session counts.
    pub sessions: SessionCounts,
    /// Time since the orchestrator was created.
    pub uptime_ms: u64,
}
