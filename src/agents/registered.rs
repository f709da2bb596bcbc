//! Registered agent wrapper with metadata and session memory.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AgentHandler, AgentResult, AgentSchema, AgentType};
use crate::registry::{Parameters, UsageStats};

/// One remembered execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    /// Task that ran.
    pub task: String,
    /// Parameters it ran with.
    pub parameters: Parameters,
    /// What came back.
    pub result: AgentResult,
    /// When it finished.
    pub timestamp: DateTime<Utc>,
}

/// Memory key for a session.
pub fn memory_key(session_id: &str) -> String {
    format!("session_{}", session_id)
}

/// Mutable metadata of a registered agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetadata {
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Session count, timing and success rate.
    pub usage: UsageStats,
    /// Sum of reported costs.
    pub total_cost: f64,
}

/// An agent schema together with its handler, metadata and memory.
///
/// Snapshots handed out by the registry share the handler.
#[derive(Clone)]
pub struct RegisteredAgent {
    schema: AgentSchema,
    handler: Arc<dyn AgentHandler>,
    metadata: AgentMetadata,
    memory: HashMap<String, MemoryEntry>,
}

impl RegisteredAgent {
    pub(crate) fn new(schema: AgentSchema, handler: Arc<dyn AgentHandler>) -> Self {
        Self {
            schema,
            handler,
            metadata: AgentMetadata {
                created_at: Utc::now(),
                usage: UsageStats::default(),
                total_cost: 0.0,
            },
            memory: HashMap::new(),
        }
    }

    /// The agent schema.
    pub fn schema(&self) -> &AgentSchema {
        &self.schema
    }

    /// The shared handler.
    pub fn handler(&self) -> &Arc<dyn AgentHandler> {
        &self.handler
    }

    /// Metadata at the time of the snapshot.
    pub fn metadata(&self) -> &AgentMetadata {
        &self.metadata
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut AgentMetadata {
        &mut self.metadata
    }

    /// Session memory at the time of the snapshot.
    pub fn memory(&self) -> &HashMap<String, MemoryEntry> {
        &self.memory
    }

    pub(crate) fn remember(&mut self, session_id: &str, entry: MemoryEntry) {
        self.memory.insert(memory_key(session_id), entry);
    }

    /// The agent id.
    pub fn id(&self) -> &str {
        &self.schema.id
    }

    /// The agent type.
    pub fn agent_type(&self) -> &AgentType {
        &self.schema.agent_type
    }

    /// Build a statistics snapshot.
    pub fn statistics(&self) -> AgentStatistics {
        let usage = &self.metadata.usage;
        AgentStatistics {
            id: self.schema.id.clone(),
            name: self.schema.name.clone(),
            agent_type: self.schema.agent_type.clone(),
            total_sessions: usage.usage_count,
            successful_sessions: usage.derived_successes(),
            failed_sessions: usage.derived_failures(),
            success_rate: usage.success_rate,
            average_execution_time_ms: usage.average_execution_time_ms,
            total_cost: self.metadata.total_cost,
            last_used: usage.last_used,
            created_at: self.metadata.created_at,
            memory_entries: self.memory.len(),
        }
    }
}

impl fmt::Debug for RegisteredAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredAgent")
            .field("schema", &self.schema)
            .field("metadata", &self.metadata)
            .field("memory_entries", &self.memory.len())
            .finish_non_exhaustive()
    }
}

/// Read-only statistics of one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatistics {
    /// Agent id.
    pub id: String,
    /// Agent name.
    pub name: String,
    /// Agent type.
    pub agent_type: AgentType,
    /// Number of executions.
    pub total_sessions: u64,
    /// `round(success_rate * total_sessions)`.
    pub successful_sessions: u64,
    /// `total_sessions - successful_sessions`.
    pub failed_sessions: u64,
    /// Running success rate.
    pub success_rate: f64,
    /// Running mean execution time.
    pub average_execution_time_ms: f64,
    /// Sum of reported costs.
    pub total_cost: f64,
    /// Last execution time.
    pub last_used: Option<DateTime<Utc>>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Number of remembered sessions.
    pub memory_entries: usize,
}
