//! Agent handler contract and the values exchanged with it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::Parameters;
use crate::tools::ToolRegistry;

/// Scheduling hint carried in an agent context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Background work.
    Low,
    /// Normal work.
    #[default]
    Medium,
    /// Urgent work.
    High,
    /// Must run now.
    Critical,
}

impl Priority {
    /// Get the string representation of the priority.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// What an agent handler can do, as reported to selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Task types the handler accepts.
    #[serde(default)]
    pub supported_task_types: Vec<String>,
    /// Concurrency hint.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_tasks: usize,
    /// Whether the handler needs a tool registry in its context.
    #[serde(default)]
    pub requires_tools: bool,
    /// Additional named capability flags.
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
}

fn default_max_concurrent() -> usize {
    1
}

impl Default for AgentCapabilities {
    fn default() -> Self {
        Self {
            supported_task_types: Vec::new(),
            max_concurrent_tasks: default_max_concurrent(),
            requires_tools: false,
            features: BTreeMap::new(),
        }
    }
}

impl AgentCapabilities {
    /// Capabilities accepting the given task types.
    pub fn for_tasks<I, S>(task_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            supported_task_types: task_types.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Whether every required capability is a supported task type.
    pub fn covers(&self, required: &[String]) -> bool {
        required
            .iter()
            .all(|r| self.supported_task_types.iter().any(|t| t == r))
    }
}

/// Input handed to an agent handler.
///
/// The tool registry handle is not serialized; it is attached by the
/// orchestrator so the handler can call tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentContext {
    /// Id of the agent to run.
    pub agent_id: String,
    /// Task name.
    pub task: String,
    /// Task parameters.
    #[serde(default)]
    pub parameters: Parameters,
    /// Session id; memory is stored under `session_<id>`.
    pub session_id: String,
    /// Calling user, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Advisory tool ids.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Advisory timeout; the registry does not enforce it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Scheduling hint.
    #[serde(default)]
    pub priority: Priority,
    /// Tool registry the handler may use.
    #[serde(skip)]
    pub tool_registry: Option<ToolRegistry>,
}

impl AgentContext {
    /// Create a context for the given agent, task and session.
    pub fn new(
        agent_id: impl Into<String>,
        task: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            task: task.into(),
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    /// Set the parameters.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Attach a user id.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach a tool registry.
    pub fn with_tool_registry(mut self, registry: ToolRegistry) -> Self {
        self.tool_registry = Some(registry);
        self
    }
}

/// Output of an agent execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    /// Whether the agent succeeded.
    pub success: bool,
    /// Result payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Measured execution time; filled in by the registry.
    #[serde(default)]
    pub execution_time_ms: u64,
    /// Cost incurred, if the handler reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Tool ids the handler actually used.
    #[serde(default)]
    pub tools_used: Vec<String>,
    /// Handler-specific metadata.
    #[serde(default)]
    pub metadata: Parameters,
}

impl AgentResult {
    /// A successful result carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            ..Default::default()
        }
    }

    /// A failed result carrying `error`.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Set the cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Record a used tool.
    pub fn with_tool_used(mut self, tool_id: impl Into<String>) -> Self {
        self.tools_used.push(tool_id.into());
        self
    }
}

/// Trait implemented by agents.
///
/// `initialize` runs once during registration and `cleanup` once during
/// unregistration. Errors from `execute` are turned into failed results by
/// the registry; they never reach the caller as `Err`.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    /// Prepare the agent. A failure aborts registration.
    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Run a task.
    async fn execute(&self, context: &AgentContext) -> anyhow::Result<AgentResult>;

    /// Accept or reject a task before it runs.
    fn validate_task(&self, _task: &str, _parameters: &Parameters) -> bool {
        true
    }

    /// Report capabilities.
    fn capabilities(&self) -> AgentCapabilities {
        AgentCapabilities::default()
    }

    /// Release resources. A failure keeps the agent registered.
    async fn cleanup(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_parse_and_default() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
        assert!(Priority::Critical > Priority::Low);
    }

    #[test]
    fn test_capabilities_cover() {
        let caps = AgentCapabilities::for_tasks(["summarize", "translate"]);
        assert_eq!(caps.max_concurrent_tasks, 1);
        assert!(caps.covers(&[]));
        assert!(caps.covers(&["translate".to_string()]));
        assert!(!caps.covers(&["translate".to_string(), "review".to_string()]));
    }

    #[test]
    fn test_context_skips_registry_in_json() {
        let ctx = AgentContext::new("a", "summarize", "s1")
            .with_user("u1")
            .with_tool_registry(ToolRegistry::new());

        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["agentId"], json!("a"));
        assert_eq!(value["priority"], json!("medium"));
        assert!(value.get("toolRegistry").is_none());
    }

    #[test]
    fn test_result_builders() {
        let ok = AgentResult::ok(json!(1)).with_cost(0.5).with_tool_used("search");
        assert!(ok.success);
        assert_eq!(ok.cost, Some(0.5));
        assert_eq!(ok.tools_used, vec!["search"]);

        let failed = AgentResult::failed("quota exceeded");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("quota exceeded"));
    }
}
