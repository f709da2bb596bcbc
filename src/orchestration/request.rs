//! Requests accepted by the orchestrator.

use serde::{Deserialize, Serialize};

use crate::agents::{AgentType, Priority};
use crate::registry::Parameters;

/// Constraints on which agent may take a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPreferences {
    /// Task types the chosen agent's handler should support.
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    /// Agent types to consider first.
    #[serde(default)]
    pub preferred_types: Vec<AgentType>,
    /// Agents that must not be chosen.
    #[serde(default)]
    pub excluded_agents: Vec<String>,
}

/// Per-request execution settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOptions {
    /// Advisory timeout handed to the agent.
    #[serde(default, alias = "timeout", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Scheduling hint handed to the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// `Some(false)` disables the utility-agent fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_fallback: Option<bool>,
    /// Retry budget. Carried as data; the orchestrator does not retry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

/// A task submitted to the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationRequest {
    /// Task name, matched against agent capabilities.
    pub task: String,
    /// Task parameters.
    #[serde(default)]
    pub parameters: Parameters,
    /// Agent constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_preferences: Option<AgentPreferences>,
    /// Tools the caller expects to be involved.
    #[serde(default)]
    pub tool_requirements: Vec<String>,
    /// Execution settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_options: Option<ExecutionOptions>,
}

impl OrchestrationRequest {
    /// Create a request for a task with no parameters.
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            ..Default::default()
        }
    }

    /// Set the parameters.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the agent preferences.
    pub fn with_preferences(mut self, preferences: AgentPreferences) -> Self {
        self.agent_preferences = Some(preferences);
        self
    }

    /// Set the execution options.
    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.execution_options = Some(options);
        self
    }

    /// Add a tool requirement.
    pub fn with_tool_requirement(mut self, tool_id: impl Into<String>) -> Self {
        self.tool_requirements.push(tool_id.into());
        self
    }

    pub(crate) fn preferences(&self) -> AgentPreferences {
        self.agent_preferences.clone().unwrap_or_default()
    }

    pub(crate) fn options(&self) -> ExecutionOptions {
        self.execution_options.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_deserializes_wire_shape() {
        let request: OrchestrationRequest = serde_json::from_value(json!({
            "task": "code-review",
            "parameters": {"repo": "core"},
            "agentPreferences": {
                "preferredTypes": ["specialist"],
                "excludedAgents": ["legacy"]
            },
            "executionOptions": {"timeout": 1000, "priority": "high", "allowFallback": false}
        }))
        .unwrap();

        assert_eq!(request.task, "code-review");
        assert_eq!(request.parameters["repo"], json!("core"));

        let prefs = request.preferences();
        assert_eq!(prefs.preferred_types, vec![AgentType::Specialist]);
        assert_eq!(prefs.excluded_agents, vec!["legacy"]);

        let options = request.options();
        assert_eq!(options.timeout_ms, Some(1000));
        assert_eq!(options.priority, Some(Priority::High));
        assert_eq!(options.allow_fallback, Some(false));
        assert_eq!(options.max_retries, None);
    }
}
