//! Thread-safe agent registry with lifecycle hooks, session memory and
//! usage tracking.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{
    AgentContext, AgentHandler, AgentQuery, AgentResult, AgentSchema, AgentStatistics, AgentType,
    MemoryEntry, RegisteredAgent,
};
use crate::registry::{
    call_guarded, invoke_guarded, read_lock, write_lock, EntryKind, RegistryError, RegistryResult,
    StatsStrategy,
};

/// Internal state of the registry.
#[derive(Debug, Default)]
struct AgentRegistryInner {
    /// All registered agents, in registration order.
    agents: Vec<RegisteredAgent>,

    /// Index from agent id to position in the agents vector.
    id_index: HashMap<String, usize>,

    /// Agent ids per type.
    type_index: HashMap<AgentType, Vec<String>>,

    /// Agent ids per specialization.
    specialization_index: HashMap<String, Vec<String>>,
}

impl AgentRegistryInner {
    fn get(&self, id: &str) -> Option<&RegisteredAgent> {
        self.id_index.get(id).map(|&idx| &self.agents[idx])
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut RegisteredAgent> {
        match self.id_index.get(id) {
            Some(&idx) => self.agents.get_mut(idx),
            None => None,
        }
    }

    fn resolve(&self, ids: Option<&Vec<String>>) -> Vec<RegisteredAgent> {
        ids.map(|ids| ids.iter().filter_map(|id| self.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    /// Check uniqueness and dependencies of a schema against current state.
    fn check_admissible(&self, schema: &AgentSchema) -> RegistryResult<()> {
        if self.id_index.contains_key(&schema.id) {
            return Err(RegistryError::duplicate(EntryKind::Agent, &schema.id));
        }
        if let Some(missing) = schema
            .dependencies
            .iter()
            .find(|dep| !self.id_index.contains_key(*dep))
        {
            return Err(RegistryError::missing_dependency(
                EntryKind::Agent,
                &schema.id,
                missing,
            ));
        }
        Ok(())
    }

    fn insert(&mut self, agent: RegisteredAgent) {
        let id = agent.id().to_string();
        self.type_index
            .entry(agent.agent_type().clone())
            .or_default()
            .push(id.clone());
        for specialization in &agent.schema().specializations {
            let ids = self
                .specialization_index
                .entry(specialization.clone())
                .or_default();
            if !ids.contains(&id) {
                ids.push(id.clone());
            }
        }

        let idx = self.agents.len();
        self.id_index.insert(id, idx);
        self.agents.push(agent);
    }

    fn remove(&mut self, agent_id: &str) -> Option<RegisteredAgent> {
        let idx = self.id_index.remove(agent_id)?;
        let removed = self.agents.remove(idx);

        for index in self.id_index.values_mut() {
            if *index > idx {
                *index -= 1;
            }
        }

        if let Some(ids) = self.type_index.get_mut(removed.agent_type()) {
            ids.retain(|id| id != agent_id);
        }
        for specialization in &removed.schema().specializations {
            if let Some(ids) = self.specialization_index.get_mut(specialization) {
                ids.retain(|id| id != agent_id);
                if ids.is_empty() {
                    self.specialization_index.remove(specialization);
                }
            }
        }

        Some(removed)
    }
}

/// Aggregate statistics of an agent registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRegistryStatistics {
    /// Number of registered agents.
    pub total_agents: usize,
    /// Agent count per type.
    pub by_type: BTreeMap<AgentType, usize>,
    /// Sum of all session counts.
    pub total_sessions: u64,
    /// Sum of all reported costs.
    pub total_cost: f64,
    /// Mean success rate over all agents; zero for an empty registry.
    pub average_success_rate: f64,
    /// Agent with the highest session count.
    pub most_used_agent: Option<String>,
}

/// Thread-safe registry of agents.
///
/// Clones share state. Handler lifecycle hooks and executions run without
/// holding the lock.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    inner: Arc<RwLock<AgentRegistryInner>>,
    strategy: StatsStrategy,
}

impl AgentRegistry {
    /// Create a new empty registry using the approximate statistics strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty registry with the given statistics strategy.
    pub fn with_strategy(strategy: StatsStrategy) -> Self {
        Self {
            inner: Arc::default(),
            strategy,
        }
    }

    /// The statistics strategy in use.
    pub fn strategy(&self) -> StatsStrategy {
        self.strategy
    }

    /// Register an agent.
    ///
    /// The schema is validated and checked for uniqueness and dependencies,
    /// then the handler is initialized. If initialization fails nothing is
    /// stored. If another registration with the same id completes while the
    /// handler initializes, the handler is cleaned up and `DuplicateId` is
    /// returned.
    pub async fn register_agent(
        &self,
        schema: AgentSchema,
        handler: Arc<dyn AgentHandler>,
    ) -> RegistryResult<String> {
        schema.validate()?;
        read_lock(&self.inner).check_admissible(&schema)?;

        let init = invoke_guarded(handler.initialize()).await;
        if let Err(message) = init.outcome {
            warn!(agent_id = %schema.id, error = %message, "Agent initialization failed");
            return Err(RegistryError::InitializationFailed {
                id: schema.id,
                message,
            });
        }

        let id = schema.id.clone();
        let admitted = {
            let mut inner = write_lock(&self.inner);
            let admissible = inner.check_admissible(&schema);
            if admissible.is_ok() {
                inner.insert(RegisteredAgent::new(schema, Arc::clone(&handler)));
            }
            admissible
        };

        if let Err(err) = admitted {
            warn!(agent_id = %id, error = %err, "Agent registration lost a race; cleaning up");
            if let Err(message) = invoke_guarded(handler.cleanup()).await.outcome {
                warn!(agent_id = %id, error = %message, "Cleanup after failed registration failed");
            }
            return Err(err);
        }

        info!(agent_id = %id, "Registered agent");
        Ok(id)
    }

    /// Register an agent after appending advisory tools to its schema.
    pub async fn register_agent_with_tools<I, S>(
        &self,
        mut schema: AgentSchema,
        handler: Arc<dyn AgentHandler>,
        tools: I,
    ) -> RegistryResult<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tool in tools {
            let tool = tool.into();
            if !schema.tools.contains(&tool) {
                schema.tools.push(tool);
            }
        }
        self.register_agent(schema, handler).await
    }

    /// Unregister an agent.
    ///
    /// Returns `Ok(false)` if the agent is not registered. The handler's
    /// `cleanup` runs first; if it fails the agent stays registered and
    /// `CleanupFailed` is returned. Agents that depend on this one are not
    /// checked.
    pub async fn unregister_agent(&self, agent_id: &str) -> RegistryResult<bool> {
        let handler = read_lock(&self.inner)
            .get(agent_id)
            .map(|a| Arc::clone(a.handler()));
        let Some(handler) = handler else {
            return Ok(false);
        };

        if let Err(message) = invoke_guarded(handler.cleanup()).await.outcome {
            warn!(agent_id, error = %message, "Agent cleanup failed");
            return Err(RegistryError::CleanupFailed {
                id: agent_id.to_string(),
                message,
            });
        }

        let removed = write_lock(&self.inner).remove(agent_id).is_some();
        if removed {
            info!(agent_id, "Unregistered agent");
        }
        Ok(removed)
    }

    /// Get a snapshot of an agent.
    pub fn get_agent(&self, agent_id: &str) -> Option<RegisteredAgent> {
        read_lock(&self.inner).get(agent_id).cloned()
    }

    /// List all agents in registration order.
    pub fn list_agents(&self) -> Vec<RegisteredAgent> {
        read_lock(&self.inner).agents.clone()
    }

    /// List agents of one type.
    pub fn list_agents_by_type(&self, agent_type: &AgentType) -> Vec<RegisteredAgent> {
        let inner = read_lock(&self.inner);
        inner.resolve(inner.type_index.get(agent_type))
    }

    /// List agents with a specialization.
    pub fn list_agents_by_specialization(&self, specialization: &str) -> Vec<RegisteredAgent> {
        let inner = read_lock(&self.inner);
        inner.resolve(inner.specialization_index.get(specialization))
    }

    /// Search agents, in registration order.
    pub fn search_agents(&self, query: &AgentQuery) -> Vec<RegisteredAgent> {
        read_lock(&self.inner)
            .agents
            .iter()
            .filter(|a| query.matches(a))
            .cloned()
            .collect()
    }

    /// Check if an agent with the given id exists.
    pub fn contains(&self, agent_id: &str) -> bool {
        read_lock(&self.inner).id_index.contains_key(agent_id)
    }

    /// Get the total number of registered agents.
    pub fn len(&self) -> usize {
        read_lock(&self.inner).agents.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Execute an agent.
    ///
    /// Only a missing agent is an `Err`. A rejected task, a handler error or
    /// a handler panic comes back as a failed result. Every call updates the
    /// agent's statistics and stores a memory entry under
    /// `session_<session_id>`.
    pub async fn execute_agent(&self, context: &AgentContext) -> RegistryResult<AgentResult> {
        let handler = read_lock(&self.inner)
            .get(&context.agent_id)
            .map(|a| Arc::clone(a.handler()))
            .ok_or_else(|| RegistryError::AgentNotFound(context.agent_id.clone()))?;

        let verdict = call_guarded(|| handler.validate_task(&context.task, &context.parameters));
        let (mut result, elapsed_ms) = match verdict {
            Ok(true) => {
                debug!(
                    agent_id = %context.agent_id,
                    task = %context.task,
                    session_id = %context.session_id,
                    "Executing agent"
                );
                let invocation = invoke_guarded(handler.execute(context)).await;
                let result = match invocation.outcome {
                    Ok(result) => result,
                    Err(message) => {
                        warn!(
                            agent_id = %context.agent_id,
                            error = %message,
                            "Agent execution failed"
                        );
                        AgentResult::failed(message)
                    }
                };
                (result, invocation.elapsed_ms)
            }
            Ok(false) => {
                warn!(agent_id = %context.agent_id, task = %context.task, "Agent rejected task");
                let result = AgentResult::failed(format!(
                    "Agent '{}' rejected task '{}'",
                    context.agent_id, context.task
                ));
                (result, 0.0)
            }
            Err(message) => {
                warn!(agent_id = %context.agent_id, error = %message, "Task validation failed");
                (AgentResult::failed(message), 0.0)
            }
        };
        result.execution_time_ms = elapsed_ms.round() as u64;

        self.record_execution(context, &result, elapsed_ms);
        Ok(result)
    }

    fn record_execution(&self, context: &AgentContext, result: &AgentResult, elapsed_ms: f64) {
        let mut inner = write_lock(&self.inner);
        let Some(agent) = inner.get_mut(&context.agent_id) else {
            debug!(agent_id = %context.agent_id, "Agent unregistered during execution; usage dropped");
            return;
        };

        let metadata = agent.metadata_mut();
        metadata.usage.record(elapsed_ms, result.success, self.strategy);
        if let Some(cost) = result.cost {
            metadata.total_cost += cost;
        }

        agent.remember(
            &context.session_id,
            MemoryEntry {
                task: context.task.clone(),
                parameters: context.parameters.clone(),
                result: result.clone(),
                timestamp: Utc::now(),
            },
        );
    }

    /// Session memory of an agent, keyed `session_<session_id>`.
    pub fn get_agent_memory(&self, agent_id: &str) -> Option<HashMap<String, MemoryEntry>> {
        read_lock(&self.inner)
            .get(agent_id)
            .map(|a| a.memory().clone())
    }

    /// Statistics of one agent.
    pub fn get_agent_statistics(&self, agent_id: &str) -> Option<AgentStatistics> {
        read_lock(&self.inner)
            .get(agent_id)
            .map(RegisteredAgent::statistics)
    }

    /// Aggregate statistics of the registry.
    pub fn get_registry_statistics(&self) -> AgentRegistryStatistics {
        let inner = read_lock(&self.inner);

        let mut by_type = BTreeMap::new();
        for agent in &inner.agents {
            *by_type.entry(agent.agent_type().clone()).or_insert(0) += 1;
        }

        let total_agents = inner.agents.len();
        let average_success_rate = if total_agents == 0 {
            0.0
        } else {
            inner
                .agents
                .iter()
                .map(|a| a.metadata().usage.success_rate)
                .sum::<f64>()
                / total_agents as f64
        };

        let mut most_used: Option<&RegisteredAgent> = None;
        for agent in &inner.agents {
            let count = agent.metadata().usage.usage_count;
            if count > 0 && most_used.map_or(true, |m| count > m.metadata().usage.usage_count) {
                most_used = Some(agent);
            }
        }

        AgentRegistryStatistics {
            total_agents,
            by_type,
            total_sessions: inner.agents.iter().map(|a| a.metadata().usage.usage_count).sum(),
            total_cost: inner.agents.iter().map(|a| a.metadata().total_cost).sum(),
            average_success_rate,
            most_used_agent: most_used.map(|a| a.id().to_string()),
        }
    }
}
