//! Registry orchestrator - agent selection, session tracking and workflows

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::selection::select_agent;
use super::{
    OrchestrationRequest, OrchestrationResult, OrchestrationSession, ResultMetadata,
    SessionCounts, SessionObserver, SessionStatus, SystemStatistics, WorkflowOutcome,
    WorkflowRunner,
};
use crate::agents::{
    AgentContext, AgentHandler, AgentQuery, AgentRegistry, AgentResult, AgentSchema, AgentType,
    Priority, RegisteredAgent,
};
use crate::registry::{
    invoke_guarded, read_lock, write_lock, EntryKind, Parameters, RegistryResult, StatsStrategy,
};
use crate::tools::{ToolCategory, ToolDefinition, ToolHandler, ToolInstance, ToolQuery, ToolRegistry};

/// Default advisory timeout handed to agents.
pub const DEFAULT_AGENT_TIMEOUT_MS: u64 = 300_000;

/// Default age after which finished sessions are cleaned up (24 hours).
pub const DEFAULT_SESSION_MAX_AGE_MS: u64 = 24 * 60 * 60 * 1000;

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestratorConfig {
    /// Timeout used when a request sets none.
    pub default_timeout_ms: u64,
    /// Priority used when a request sets none.
    pub default_priority: Priority,
    /// Report `fallback_used: true` when a utility agent stood in. When
    /// false the flag is always false.
    pub report_fallback_usage: bool,
    /// Age used by `cleanup_expired_sessions`.
    pub session_max_age_ms: u64,
    /// Statistics strategy for registries built by `from_config`.
    pub stats_strategy: StatsStrategy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_AGENT_TIMEOUT_MS,
            default_priority: Priority::Medium,
            report_fallback_usage: false,
            session_max_age_ms: DEFAULT_SESSION_MAX_AGE_MS,
            stats_strategy: StatsStrategy::Approximate,
        }
    }
}

impl OrchestratorConfig {
    /// Session max age as a duration.
    pub fn session_max_age(&self) -> Duration {
        Duration::from_millis(self.session_max_age_ms)
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Coordinates a tool registry and an agent registry.
///
/// Each `execute_task` call creates a session, picks an agent, runs it
/// through the agent registry and returns a normalized result. Failures of
/// any kind come back as failed results; `execute_task` never errors.
/// Clones share registries, sessions, workflows and observers.
#[derive(Clone)]
pub struct RegistryOrchestrator {
    tools: ToolRegistry,
    agents: AgentRegistry,
    sessions: Arc<RwLock<HashMap<String, OrchestrationSession>>>,
    workflows: Arc<RwLock<HashMap<String, Arc<dyn WorkflowRunner>>>>,
    observers: Arc<RwLock<Vec<Arc<dyn SessionObserver>>>>,
    config: OrchestratorConfig,
    started: Instant,
}

impl RegistryOrchestrator {
    /// Create an orchestrator over existing registries with default settings.
    pub fn new(tools: ToolRegistry, agents: AgentRegistry) -> Self {
        Self::with_config(tools, agents, OrchestratorConfig::default())
    }

    /// Create an orchestrator over existing registries.
    pub fn with_config(tools: ToolRegistry, agents: AgentRegistry, config: OrchestratorConfig) -> Self {
        Self {
            tools,
            agents,
            sessions: Arc::default(),
            workflows: Arc::default(),
            observers: Arc::default(),
            config,
            started: Instant::now(),
        }
    }

    /// Create an orchestrator with fresh registries using the configured
    /// statistics strategy.
    pub fn from_config(config: OrchestratorConfig) -> Self {
        Self::with_config(
            ToolRegistry::with_strategy(config.stats_strategy),
            AgentRegistry::with_strategy(config.stats_strategy),
            config,
        )
    }

    /// The tool registry.
    pub fn tool_registry(&self) -> &ToolRegistry {
        &self.tools
    }

    /// The agent registry.
    pub fn agent_registry(&self) -> &AgentRegistry {
        &self.agents
    }

    /// The configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Add a session observer.
    pub fn add_observer(&self, observer: Arc<dyn SessionObserver>) {
        write_lock(&self.observers).push(observer);
    }

    fn observers(&self) -> Vec<Arc<dyn SessionObserver>> {
        read_lock(&self.observers).clone()
    }

    /// Register a workflow runner, replacing any runner with the same name.
    pub fn register_workflow(&self, name: impl Into<String>, runner: Arc<dyn WorkflowRunner>) {
        let name = name.into();
        debug!(workflow = %name, "Registered workflow");
        write_lock(&self.workflows).insert(name, runner);
    }

    /// Names of the registered workflows, sorted.
    pub fn list_workflows(&self) -> Vec<String> {
        let mut names: Vec<String> = read_lock(&self.workflows).keys().cloned().collect();
        names.sort();
        names
    }

    /// Register a tool with the tool registry.
    pub fn register_tool(
        &self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> RegistryResult<String> {
        let id = definition.id.clone();
        let outcome = self.tools.register_tool(definition, handler);
        self.report_registration(EntryKind::Tool, &id, &outcome);
        outcome
    }

    /// Register an agent with the agent registry.
    pub async fn register_agent(
        &self,
        schema: AgentSchema,
        handler: Arc<dyn AgentHandler>,
    ) -> RegistryResult<String> {
        let id = schema.id.clone();
        let outcome = self.agents.register_agent(schema, handler).await;
        self.report_registration(EntryKind::Agent, &id, &outcome);
        outcome
    }

    fn report_registration(&self, kind: EntryKind, id: &str, outcome: &RegistryResult<String>) {
        match outcome {
            Ok(_) => {
                info!(kind = %kind, id, "Registration accepted");
                for observer in self.observers() {
                    observer.on_registered(kind, id);
                }
            }
            Err(err) => {
                warn!(kind = %kind, id, error = %err, "Registration rejected");
                let message = err.to_string();
                for observer in self.observers() {
                    observer.on_registration_failed(kind, id, &message);
                }
            }
        }
    }

    /// Run a task on the best available agent.
    pub async fn execute_task(
        &self,
        request: OrchestrationRequest,
        user_id: Option<&str>,
    ) -> OrchestrationResult {
        let start = Instant::now();
        let session = self.start_session(request, user_id);

        let mut result = self.run_task(&session).await;
        result.execution_time_ms = elapsed_ms(start);
        self.finish(&session.id, result)
    }

    async fn run_task(&self, session: &OrchestrationSession) -> OrchestrationResult {
        let request = &session.request;
        let mut metadata = ResultMetadata::for_session(&session.id);

        let Some(selection) = select_agent(&self.agents, request) else {
            let error = format!("No suitable agent found for task: {}", request.task);
            self.update_session(&session.id, |s| {
                s.fail(error.clone());
            });
            return OrchestrationResult::failure(error, metadata);
        };

        let agent_id = selection.agent.id().to_string();
        metadata.agent_used = Some(agent_id.clone());
        metadata.fallback_used = selection.fallback && self.config.report_fallback_usage;

        self.update_session(&session.id, |s| {
            s.agent_id = Some(agent_id.clone());
            s.transition(SessionStatus::Executing);
        });

        let options = request.options();
        let context = AgentContext {
            agent_id,
            task: request.task.clone(),
            parameters: request.parameters.clone(),
            session_id: session.id.clone(),
            user_id: session.user_id.clone(),
            tools: selection.agent.schema().tools.clone(),
            timeout_ms: Some(options.timeout_ms.unwrap_or(self.config.default_timeout_ms)),
            priority: options.priority.unwrap_or(self.config.default_priority),
            tool_registry: Some(self.tools.clone()),
        };

        match self.agents.execute_agent(&context).await {
            Ok(agent_result) => {
                let AgentResult {
                    success,
                    data,
                    error,
                    cost,
                    tools_used,
                    ..
                } = agent_result;

                self.update_session(&session.id, |s| {
                    s.transition(SessionStatus::Completed);
                    s.last_error = error.clone();
                });

                metadata.tools_used = if tools_used.is_empty() {
                    context.tools
                } else {
                    tools_used
                };

                OrchestrationResult {
                    success,
                    data,
                    error,
                    execution_time_ms: 0,
                    cost: cost.unwrap_or(0.0),
                    metadata,
                }
            }
            Err(err) => {
                let error = err.to_string();
                self.update_session(&session.id, |s| {
                    s.fail(error.clone());
                });
                OrchestrationResult::failure(error, metadata)
            }
        }
    }

    /// Run a registered workflow.
    ///
    /// The run is tracked as a session whose task is `workflow:<name>`. An
    /// unknown workflow or a runner error yields a failed result.
    pub async fn execute_workflow(
        &self,
        name: &str,
        context: Parameters,
        user_id: Option<&str>,
    ) -> OrchestrationResult {
        let start = Instant::now();
        let request =
            OrchestrationRequest::new(format!("workflow:{}", name)).with_parameters(context);
        let session = self.start_session(request, user_id);
        let metadata = ResultMetadata::for_session(&session.id);

        let runner = read_lock(&self.workflows).get(name).cloned();
        let mut result = match runner {
            None => {
                let error = format!("Unknown workflow: {}", name);
                self.update_session(&session.id, |s| {
                    s.fail(error.clone());
                });
                OrchestrationResult::failure(error, metadata)
            }
            Some(runner) => {
                self.update_session(&session.id, |s| {
                    s.transition(SessionStatus::Executing);
                });
                let invocation =
                    invoke_guarded(runner.run(self, &session.request.parameters, user_id)).await;
                self.workflow_result(&session.id, name, invocation.outcome, metadata)
            }
        };

        result.execution_time_ms = elapsed_ms(start);
        self.finish(&session.id, result)
    }

    fn workflow_result(
        &self,
        session_id: &str,
        name: &str,
        outcome: Result<WorkflowOutcome, String>,
        mut metadata: ResultMetadata,
    ) -> OrchestrationResult {
        match outcome {
            Ok(outcome) => {
                let last_agent = outcome.agents_used.last().cloned();
                self.update_session(session_id, |s| {
                    s.agent_id = last_agent.clone();
                    s.transition(SessionStatus::Completed);
                    s.last_error = outcome.error.clone();
                });
                metadata.agent_used = last_agent;
                metadata.tools_used = outcome.tools_used;
                OrchestrationResult {
                    success: outcome.success,
                    data: outcome.data,
                    error: outcome.error,
                    execution_time_ms: 0,
                    cost: outcome.cost,
                    metadata,
                }
            }
            Err(message) => {
                let error = format!("Workflow '{}' failed: {}", name, message);
                self.update_session(session_id, |s| {
                    s.fail(error.clone());
                });
                OrchestrationResult::failure(error, metadata)
            }
        }
    }

    fn start_session(&self, request: OrchestrationRequest, user_id: Option<&str>) -> OrchestrationSession {
        let session = OrchestrationSession::new(request, user_id.map(str::to_string));
        write_lock(&self.sessions).insert(session.id.clone(), session.clone());

        debug!(session_id = %session.id, task = %session.request.task, "Session started");
        for observer in self.observers() {
            observer.on_session_started(&session);
        }
        session
    }

    fn update_session<F>(&self, session_id: &str, update: F)
    where
        F: FnOnce(&mut OrchestrationSession),
    {
        if let Some(session) = write_lock(&self.sessions).get_mut(session_id) {
            update(session);
        }
    }

    fn finish(&self, session_id: &str, mut result: OrchestrationResult) -> OrchestrationResult {
        let Some(session) = self.get_session(session_id) else {
            return result;
        };
        result.metadata.retries = session.retries;

        if result.success {
            info!(
                session_id,
                agent_id = ?session.agent_id,
                execution_time_ms = result.execution_time_ms,
                "Session finished"
            );
        } else {
            warn!(
                session_id,
                status = %session.status,
                error = ?result.error,
                "Session finished without success"
            );
        }

        for observer in self.observers() {
            observer.on_session_finished(&session, &result);
        }
        result
    }

    /// Tools, optionally restricted to one category.
    pub fn get_available_tools(&self, category: Option<ToolCategory>) -> Vec<ToolInstance> {
        match category {
            Some(category) => self.tools.list_tools_by_category(category),
            None => self.tools.list_tools(),
        }
    }

    /// Agents, optionally restricted to one type.
    pub fn get_available_agents(&self, agent_type: Option<&AgentType>) -> Vec<RegisteredAgent> {
        match agent_type {
            Some(agent_type) => self.agents.list_agents_by_type(agent_type),
            None => self.agents.list_agents(),
        }
    }

    /// Search the tool registry.
    pub fn search_tools(&self, query: &ToolQuery) -> Vec<ToolInstance> {
        self.tools.search_tools(query)
    }

    /// Search the agent registry.
    pub fn search_agents(&self, query: &AgentQuery) -> Vec<RegisteredAgent> {
        self.agents.search_agents(query)
    }

    /// Snapshot of one session.
    pub fn get_session(&self, session_id: &str) -> Option<OrchestrationSession> {
        read_lock(&self.sessions).get(session_id).cloned()
    }

    /// All tracked sessions, oldest first.
    pub fn list_sessions(&self) -> Vec<OrchestrationSession> {
        let mut sessions: Vec<_> = read_lock(&self.sessions).values().cloned().collect();
        sessions.sort_by_key(|s| s.started_at);
        sessions
    }

    /// Statistics of both registries and the session table.
    pub fn get_system_statistics(&self) -> SystemStatistics {
        let mut counts = SessionCounts::default();
        for session in read_lock(&self.sessions).values() {
            counts.total += 1;
            match session.status {
                SessionStatus::Completed => counts.completed += 1,
                SessionStatus::Failed => counts.failed += 1,
                SessionStatus::Initializing | SessionStatus::Executing => counts.active += 1,
            }
        }

        SystemStatistics {
            tools: self.tools.get_registry_statistics(),
            agents: self.agents.get_registry_statistics(),
            sessions: counts,
            uptime_ms: elapsed_ms(self.started),
        }
    }

    /// Remove finished sessions that completed at least `max_age` ago.
    /// Sessions still in flight are kept. Returns the number removed.
    pub fn cleanup_sessions(&self, max_age: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| chrono::Utc::now().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            return 0;
        };

        let mut sessions = write_lock(&self.sessions);
        let before = sessions.len();
        sessions.retain(|_, s| !matches!(s.completed_at, Some(done) if done <= cutoff));
        let removed = before - sessions.len();

        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Cleaned up sessions");
        }
        removed
    }

    /// Remove finished sessions older than the configured max age.
    pub fn cleanup_expired_sessions(&self) -> usize {
        self.cleanup_sessions(self.config.session_max_age())
    }
}

impl Default for RegistryOrchestrator {
    fn default() -> Self {
        Self::from_config(OrchestratorConfig::default())
    }
}

impl fmt::Debug for RegistryOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryOrchestrator")
            .field("tools", &self.tools.len())
            .field("agents", &self.agents.len())
            .field("sessions", &read_lock(&self.sessions).len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
