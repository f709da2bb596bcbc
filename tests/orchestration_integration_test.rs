//! Integration test for the registry orchestrator
//!
//! Drives agent selection, session tracking and workflows end to end with
//! recording mock agents and tools.

use agentreg::agents::{
    AgentCapabilities, AgentContext, AgentHandler, AgentResult, AgentSchema, AgentType,
};
use agentreg::orchestration::{
    AgentPreferences, OrchestrationRequest, RegistryOrchestrator, SequentialWorkflow,
    SessionStatus, WorkflowStep,
};
use agentreg::registry::Parameters;
use agentreg::tools::{ToolCategory, ToolContext, ToolDefinition, ToolHandler, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// What a mock agent was asked to do
#[derive(Debug, Clone)]
struct SeenTask {
    agent: String,
    task: String,
    parameters: Parameters,
    user: Option<String>,
}

// Mock agent that records every execution
struct RecordingAgent {
    seen: Arc<Mutex<Vec<SeenTask>>>,
    cost: Option<f64>,
    delay: Option<Duration>,
}

impl RecordingAgent {
    fn new(seen: &Arc<Mutex<Vec<SeenTask>>>) -> Self {
        Self {
            seen: Arc::clone(seen),
            cost: None,
            delay: None,
        }
    }

    fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl AgentHandler for RecordingAgent {
    async fn execute(&self, context: &AgentContext) -> Result<AgentResult> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.seen.lock().unwrap().push(SeenTask {
            agent: context.agent_id.clone(),
            task: context.task.clone(),
            parameters: context.parameters.clone(),
            user: context.user_id.clone(),
        });

        let mut result = AgentResult::ok(json!({
            "agent": context.agent_id,
            "task": context.task,
        }));
        result.cost = self.cost;
        Ok(result)
    }
}

// Tool that upper-cases its `text` parameter
struct UpperTool;

#[async_trait]
impl ToolHandler for UpperTool {
    async fn execute(&self, context: &ToolContext) -> Result<ToolResult> {
        let text = context
            .parameters
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(ToolResult::ok(json!(text.to_uppercase())))
    }

    fn validate_parameters(&self, parameters: &Parameters) -> bool {
        parameters.get("text").map(Value::is_string).unwrap_or(false)
    }
}

// Agent that delegates to a tool through the registry in its context
struct ShoutingAgent;

#[async_trait]
impl AgentHandler for ShoutingAgent {
    async fn execute(&self, context: &AgentContext) -> Result<AgentResult> {
        let tools = context
            .tool_registry
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no tool registry in context"))?;

        let tool_context = ToolContext::new("text.upper", context.parameters.clone())
            .with_session(context.session_id.clone());
        let output = tools.execute_tool(&tool_context).await?;

        Ok(AgentResult {
            success: output.success,
            data: output.data,
            error: output.error,
            ..Default::default()
        }
        .with_tool_used("text.upper"))
    }
}

// Which hook of a faulty agent panics
#[derive(Debug, Clone, Copy, PartialEq)]
enum Fault {
    Validate,
    Execute,
    Capabilities,
}

struct FaultyAgent(Fault);

#[async_trait]
impl AgentHandler for FaultyAgent {
    async fn execute(&self, context: &AgentContext) -> Result<AgentResult> {
        if self.0 == Fault::Execute {
            panic!("lost connection to model");
        }
        Ok(AgentResult::ok(json!({ "agent": context.agent_id })))
    }

    fn validate_task(&self, _task: &str, _parameters: &Parameters) -> bool {
        if self.0 == Fault::Validate {
            panic!("validator broke");
        }
        true
    }

    fn capabilities(&self) -> AgentCapabilities {
        if self.0 == Fault::Capabilities {
            panic!("capabilities broke");
        }
        AgentCapabilities::default()
    }
}

fn recorder() -> Arc<Mutex<Vec<SeenTask>>> {
    Arc::new(Mutex::new(Vec::new()))
}

async fn register(
    orchestrator: &RegistryOrchestrator,
    schema: AgentSchema,
    handler: impl AgentHandler + 'static,
) {
    orchestrator
        .register_agent(schema, Arc::new(handler))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_capable_agent_is_selected() {
    let seen = recorder();
    let orchestrator = RegistryOrchestrator::default();
    register(
        &orchestrator,
        AgentSchema::new("helper", "Helper", AgentType::Utility),
        RecordingAgent::new(&seen),
    )
    .await;
    register(
        &orchestrator,
        AgentSchema::new("reviewer", "Reviewer", AgentType::Specialist)
            .with_capability("code-review")
            .with_tool("git.diff"),
        RecordingAgent::new(&seen).with_cost(0.5),
    )
    .await;

    let mut parameters = Parameters::new();
    parameters.insert("file".to_string(), json!("src/lib.rs"));
    let result = orchestrator
        .execute_task(
            OrchestrationRequest::new("code-review").with_parameters(parameters.clone()),
            Some("alice"),
        )
        .await;

    assert!(result.success);
    assert_eq!(result.metadata.agent_used.as_deref(), Some("reviewer"));
    assert_eq!(result.metadata.tools_used, vec!["git.diff".to_string()]);
    assert!(!result.metadata.fallback_used);
    assert_eq!(result.cost, 0.5);
    assert_eq!(result.data.unwrap()["task"], json!("code-review"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].agent, "reviewer");
    assert_eq!(seen[0].parameters, parameters);
    assert_eq!(seen[0].user.as_deref(), Some("alice"));

    let session = orchestrator.get_session(&result.metadata.session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.agent_id.as_deref(), Some("reviewer"));
    assert!(session.completed_at.is_some());

    let stats = orchestrator
        .agent_registry()
        .get_agent_statistics("reviewer")
        .unwrap();
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.total_cost, 0.5);
}

#[tokio::test]
async fn test_excluded_agent_is_skipped() {
    let seen = recorder();
    let orchestrator = RegistryOrchestrator::default();
    for id in ["first", "second"] {
        register(
            &orchestrator,
            AgentSchema::new(id, id, AgentType::Specialist).with_capability("code-review"),
            RecordingAgent::new(&seen),
        )
        .await;
    }

    let request = OrchestrationRequest::new("code-review").with_preferences(AgentPreferences {
        excluded_agents: vec!["first".to_string()],
        ..Default::default()
    });
    let result = orchestrator.execute_task(request, None).await;

    assert!(result.success);
    assert_eq!(result.metadata.agent_used.as_deref(), Some("second"));
}

#[tokio::test]
async fn test_no_suitable_agent() {
    let seen = recorder();
    let orchestrator = RegistryOrchestrator::default();
    register(
        &orchestrator,
        AgentSchema::new("reviewer", "Reviewer", AgentType::Specialist)
            .with_capability("code-review"),
        RecordingAgent::new(&seen),
    )
    .await;

    let result = orchestrator
        .execute_task(OrchestrationRequest::new("translate"), None)
        .await;

    assert!(!result.success);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .starts_with("No suitable agent found"));
    assert_eq!(result.cost, 0.0);
    assert!(result.metadata.agent_used.is_none());
    assert!(seen.lock().unwrap().is_empty());

    let session = orchestrator.get_session(&result.metadata.session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Failed);
    assert_eq!(orchestrator.get_system_statistics().sessions.failed, 1);
}

#[tokio::test]
async fn test_agent_uses_tool_from_context() {
    let orchestrator = RegistryOrchestrator::default();
    orchestrator
        .register_tool(
            ToolDefinition::new("text.upper", "Upper", "Upper-case text", ToolCategory::Utility),
            Arc::new(UpperTool),
        )
        .unwrap();
    register(
        &orchestrator,
        AgentSchema::new("shouter", "Shouter", AgentType::Creative).with_capability("shout"),
        ShoutingAgent,
    )
    .await;

    let mut parameters = Parameters::new();
    parameters.insert("text".to_string(), json!("hello"));
    let result = orchestrator
        .execute_task(OrchestrationRequest::new("shout").with_parameters(parameters), None)
        .await;

    assert!(result.success);
    assert_eq!(result.data, Some(json!("HELLO")));
    assert_eq!(result.metadata.tools_used, vec!["text.upper".to_string()]);

    let tool_stats = orchestrator
        .tool_registry()
        .get_tool_statistics("text.upper")
        .unwrap();
    assert_eq!(tool_stats.usage_count, 1);
    assert_eq!(tool_stats.success_rate, 1.0);

    // Invalid tool parameters come back as a failed agent result
    let result = orchestrator
        .execute_task(OrchestrationRequest::new("shout"), None)
        .await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("invalid parameters for tool 'text.upper'"));
    assert_eq!(
        orchestrator
            .tool_registry()
            .get_tool_statistics("text.upper")
            .unwrap()
            .usage_count,
        1
    );
}

#[tokio::test]
async fn test_sequential_workflow() {
    let seen = recorder();
    let orchestrator = RegistryOrchestrator::default();
    register(
        &orchestrator,
        AgentSchema::new("extractor", "Extractor", AgentType::Analytical).with_capability("extract"),
        RecordingAgent::new(&seen).with_cost(0.25),
    )
    .await;
    register(
        &orchestrator,
        AgentSchema::new("summarizer", "Summarizer", AgentType::Creative)
            .with_capability("summarize"),
        RecordingAgent::new(&seen).with_cost(0.5),
    )
    .await;

    let workflow = SequentialWorkflow::new()
        .then(WorkflowStep::new("extract").with_parameter("mode", json!("fast")))
        .then_task("summarize");
    orchestrator.register_workflow("digest", Arc::new(workflow));
    assert_eq!(orchestrator.list_workflows(), vec!["digest".to_string()]);

    let mut context = Parameters::new();
    context.insert("doc".to_string(), json!("report.md"));
    context.insert("mode".to_string(), json!("slow"));
    let result = orchestrator
        .execute_workflow("digest", context, Some("bob"))
        .await;

    assert!(result.success);
    assert_eq!(result.cost, 0.75);
    assert_eq!(result.metadata.agent_used.as_deref(), Some("summarizer"));
    assert_eq!(result.data.as_ref().unwrap().as_array().unwrap().len(), 2);

    let seen = seen.lock().unwrap();
    let tasks: Vec<&str> = seen.iter().map(|s| s.task.as_str()).collect();
    assert_eq!(tasks, vec!["extract", "summarize"]);
    assert_eq!(seen[0].parameters["mode"], json!("fast"));
    assert_eq!(seen[0].parameters["doc"], json!("report.md"));
    assert_eq!(seen[1].parameters["mode"], json!("slow"));
    assert_eq!(seen[1].user.as_deref(), Some("bob"));

    let session = orchestrator.get_session(&result.metadata.session_id).unwrap();
    assert_eq!(session.request.task, "workflow:digest");
    assert_eq!(session.status, SessionStatus::Completed);
    // One workflow session plus one per step
    assert_eq!(orchestrator.list_sessions().len(), 3);
}

#[tokio::test]
async fn test_workflow_stops_at_failed_step() {
    let seen = recorder();
    let orchestrator = RegistryOrchestrator::default();
    register(
        &orchestrator,
        AgentSchema::new("extractor", "Extractor", AgentType::Analytical).with_capability("extract"),
        RecordingAgent::new(&seen),
    )
    .await;

    let workflow = SequentialWorkflow::new()
        .then_task("extract")
        .then_task("publish")
        .then_task("extract");
    orchestrator.register_workflow("broken", Arc::new(workflow));

    let result = orchestrator
        .execute_workflow("broken", Parameters::new(), None)
        .await;

    assert!(!result.success);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .starts_with("step 2 (publish) failed: No suitable agent found"));
    assert_eq!(seen.lock().unwrap().len(), 1);

    let unknown = orchestrator
        .execute_workflow("missing", Parameters::new(), None)
        .await;
    assert_eq!(unknown.error.as_deref(), Some("Unknown workflow: missing"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cleanup_keeps_sessions_in_flight() {
    let seen = recorder();
    let orchestrator = RegistryOrchestrator::default();
    register(
        &orchestrator,
        AgentSchema::new("quick", "Quick", AgentType::Utility).with_capability("quick"),
        RecordingAgent::new(&seen),
    )
    .await;
    register(
        &orchestrator,
        AgentSchema::new("slow", "Slow", AgentType::Specialist).with_capability("slow"),
        RecordingAgent::new(&seen).with_delay(Duration::from_millis(300)),
    )
    .await;

    for _ in 0..2 {
        let result = orchestrator
            .execute_task(OrchestrationRequest::new("quick"), None)
            .await;
        assert!(result.success);
    }

    let background = orchestrator.clone();
    let handle = tokio::spawn(async move {
        background
            .execute_task(OrchestrationRequest::new("slow"), None)
            .await
    });

    let mut in_flight = None;
    for _ in 0..100 {
        in_flight = orchestrator
            .list_sessions()
            .into_iter()
            .find(|s| s.status == SessionStatus::Executing);
        if in_flight.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let in_flight = in_flight.expect("slow session should be executing");

    assert_eq!(orchestrator.cleanup_sessions(Duration::ZERO), 2);
    let remaining = orchestrator.list_sessions();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, in_flight.id);

    let result = handle.await.unwrap();
    assert!(result.success);
    assert_eq!(orchestrator.cleanup_sessions(Duration::ZERO), 1);
    assert!(orchestrator.list_sessions().is_empty());
}

#[tokio::test]
async fn test_panicking_validator_finishes_session() {
    let orchestrator = RegistryOrchestrator::default();
    register(
        &orchestrator,
        AgentSchema::new("fragile", "Fragile", AgentType::Specialist).with_capability("audit"),
        FaultyAgent(Fault::Validate),
    )
    .await;

    let result = orchestrator
        .execute_task(OrchestrationRequest::new("audit"), None)
        .await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("handler panicked: validator broke"));
    assert_eq!(result.metadata.agent_used.as_deref(), Some("fragile"));

    let session = orchestrator.get_session(&result.metadata.session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert!(session.completed_at.is_some());
    assert_eq!(orchestrator.get_system_statistics().sessions.active, 0);
    assert_eq!(orchestrator.cleanup_sessions(Duration::ZERO), 1);
}

#[tokio::test]
async fn test_panicking_agent_is_recorded() {
    let orchestrator = RegistryOrchestrator::default();
    register(
        &orchestrator,
        AgentSchema::new("fragile", "Fragile", AgentType::Specialist).with_capability("audit"),
        FaultyAgent(Fault::Execute),
    )
    .await;

    let result = orchestrator
        .execute_task(OrchestrationRequest::new("audit"), None)
        .await;
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("handler panicked: lost connection to model")
    );

    let agents = orchestrator.agent_registry();
    let stats = agents.get_agent_statistics("fragile").unwrap();
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.failed_sessions, 1);
    let memory = agents.get_agent_memory("fragile").unwrap();
    let key = format!("session_{}", result.metadata.session_id);
    assert!(!memory[&key].result.success);

    let session = orchestrator.get_session(&result.metadata.session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.last_error, result.error);
}

#[tokio::test]
async fn test_panicking_capabilities_lose_selection() {
    let seen = recorder();
    let orchestrator = RegistryOrchestrator::default();
    register(
        &orchestrator,
        AgentSchema::new("fragile", "Fragile", AgentType::Specialist).with_capability("audit"),
        FaultyAgent(Fault::Capabilities),
    )
    .await;
    register(
        &orchestrator,
        AgentSchema::new("steady", "Steady", AgentType::Specialist).with_capability("audit"),
        RecordingAgent::new(&seen),
    )
    .await;

    // Without requirements every sound candidate covers them
    let result = orchestrator
        .execute_task(OrchestrationRequest::new("audit"), None)
        .await;
    assert!(result.success);
    assert_eq!(result.metadata.agent_used.as_deref(), Some("steady"));
    assert_eq!(seen.lock().unwrap().len(), 1);
}
