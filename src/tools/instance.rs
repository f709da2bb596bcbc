//! Registered tool wrapper with usage tracking.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ToolCategory, ToolDefinition, ToolHandler};
use crate::registry::UsageStats;

/// A tool definition together with its handler and usage metadata.
///
/// Instances handed out by the registry are snapshots; the handler is shared.
#[derive(Clone)]
pub struct ToolInstance {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
    registered_at: DateTime<Utc>,
    usage: UsageStats,
}

impl ToolInstance {
    pub(crate) fn new(definition: ToolDefinition, handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            definition,
            handler,
            registered_at: Utc::now(),
            usage: UsageStats::default(),
        }
    }

    /// The tool definition.
    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// The shared handler.
    pub fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }

    /// Usage metadata at the time of the snapshot.
    pub fn usage(&self) -> &UsageStats {
        &self.usage
    }

    pub(crate) fn usage_mut(&mut self) -> &mut UsageStats {
        &mut self.usage
    }

    /// When the tool was registered.
    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// The tool id.
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// The tool name.
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// The tool category.
    pub fn category(&self) -> ToolCategory {
        self.definition.category
    }

    /// Build a statistics snapshot.
    pub fn statistics(&self) -> ToolStatistics {
        ToolStatistics {
            id: self.definition.id.clone(),
            name: self.definition.name.clone(),
            category: self.definition.category,
            usage_count: self.usage.usage_count,
            average_execution_time_ms: self.usage.average_execution_time_ms,
            success_rate: self.usage.success_rate,
            last_used: self.usage.last_used,
            registered_at: self.registered_at,
        }
    }
}

impl fmt::Debug for ToolInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolInstance")
            .field("definition", &self.definition)
            .field("registered_at", &self.registered_at)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Read-only usage snapshot of one tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolStatistics {
    /// Tool id.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Tool category.
    pub category: ToolCategory,
    /// Number of executions.
    pub usage_count: u64,
    /// Running mean execution time.
    pub average_execution_time_ms: f64,
    /// Running success rate.
    pub success_rate: f64,
    /// Last execution time.
    pub last_used: Option<DateTime<Utc>>,
    /// Registration time.
    pub registered_at: DateTime<Utc>,
}
