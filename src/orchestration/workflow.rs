//! Workflow runners - multi-step task execution through the orchestrator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{AgentPreferences, OrchestrationRequest, RegistryOrchestrator};
use crate::registry::Parameters;

/// What a workflow run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOutcome {
    /// Whether every step succeeded.
    pub success: bool,
    /// Workflow output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Sum of step costs.
    #[serde(default)]
    pub cost: f64,
    /// Agents that ran, in order of first use.
    #[serde(default)]
    pub agents_used: Vec<String>,
    /// Tools that were used, in order of first use.
    #[serde(default)]
    pub tools_used: Vec<String>,
}

impl Default for WorkflowOutcome {
    fn default() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            cost: 0.0,
            agents_used: Vec::new(),
            tools_used: Vec::new(),
        }
    }
}

/// Multi-step pipeline registered with the orchestrator by name.
///
/// An `Err` from `run` fails the workflow session; an outcome with
/// `success: false` completes it with a failed result.
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    /// Run the workflow.
    async fn run(
        &self,
        orchestrator: &RegistryOrchestrator,
        context: &Parameters,
        user_id: Option<&str>,
    ) -> anyhow::Result<WorkflowOutcome>;
}

/// One task in a sequential workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    /// Task name.
    pub task: String,
    /// Step parameters; they override the workflow context.
    #[serde(default)]
    pub parameters: Parameters,
    /// Agent constraints for this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_preferences: Option<AgentPreferences>,
}

impl WorkflowStep {
    /// Create a step for a task.
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            parameters: Parameters::new(),
            agent_preferences: None,
        }
    }

    /// Set a step parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Set agent preferences.
    pub fn with_preferences(mut self, preferences: AgentPreferences) -> Self {
        self.agent_preferences = Some(preferences);
        self
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.task)
    }
}

/// Runs its steps one after another through `execute_task`, stopping at the
/// first failed step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequentialWorkflow {
    steps: Vec<WorkflowStep>,
}

impl SequentialWorkflow {
    /// Create an empty workflow.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn then(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a step for a task with no extra parameters.
    pub fn then_task(self, task: impl Into<String>) -> Self {
        self.then(WorkflowStep::new(task))
    }

    /// The steps.
    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

#[async_trait]
impl WorkflowRunner for SequentialWorkflow {
    async fn run(
        &self,
        orchestrator: &RegistryOrchestrator,
        context: &Parameters,
        user_id: Option<&str>,
    ) -> anyhow::Result<WorkflowOutcome> {
        if self.steps.is_empty() {
            anyhow::bail!("workflow has no steps");
        }

        let mut outcome = WorkflowOutcome::default();
        let mut outputs = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let mut parameters = context.clone();
            parameters.extend(step.parameters.clone());

            let mut request = OrchestrationRequest::new(&step.task).with_parameters(parameters);
            request.agent_preferences = step.agent_preferences.clone();

            let result = orchestrator.execute_task(request, user_id).await;

            outcome.cost += result.cost;
            if let Some(agent) = &result.metadata.agent_used {
                push_unique(&mut outcome.agents_used, agent);
            }
            for tool in &result.metadata.tools_used {
                push_unique(&mut outcome.tools_used, tool);
            }
            outputs.push(json!({
                "task": step.task,
                "sessionId": result.metadata.session_id,
                "success": result.success,
                "data": result.data,
            }));

            if !result.success {
                outcome.success = false;
                outcome.error = Some(format!(
                    "step {} ({}) failed: {}",
                    index + 1,
                    step,
                    result.error.unwrap_or_default()
                ));
                break;
            }
        }

        outcome.data = Some(Value::Array(outputs));
        Ok(outcome)
    }
}
