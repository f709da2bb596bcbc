//! Agent selection for a request.

use tracing::{debug, warn};

use super::OrchestrationRequest;
use crate::agents::{AgentQuery, AgentRegistry, AgentType, RegisteredAgent};
use crate::registry::call_guarded;

/// The agent chosen for a request.
#[derive(Debug, Clone)]
pub(crate) struct Selection {
    pub(crate) agent: RegisteredAgent,
    /// True when no agent declared the task and a utility agent stands in.
    pub(crate) fallback: bool,
}

/// Pick an agent for the request.
///
/// Agents declaring the task as a capability (and matching the preferred
/// types) are considered first, then utility agents unless the request
/// disables the fallback. Among the candidates, the first whose handler
/// supports every required capability wins; otherwise the first candidate.
/// A handler whose capability report panics covers nothing.
pub(crate) fn select_agent(
    agents: &AgentRegistry,
    request: &OrchestrationRequest,
) -> Option<Selection> {
    let preferences = request.preferences();

    let query = AgentQuery {
        capabilities: vec![request.task.clone()],
        types: preferences.preferred_types.clone(),
        excluded: preferences.excluded_agents.clone(),
        ..Default::default()
    };
    let mut candidates = agents.search_agents(&query);
    let mut fallback = false;

    if candidates.is_empty() {
        if request.options().allow_fallback == Some(false) {
            debug!(task = %request.task, "No capable agent and fallback disabled");
            return None;
        }

        candidates = agents
            .list_agents_by_type(&AgentType::Utility)
            .into_iter()
            .filter(|a| !preferences.excluded_agents.iter().any(|id| id == a.id()))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        fallback = true;
        warn!(task = %request.task, "No capable agent; falling back to a utility agent");
    }

    let required = &preferences.required_capabilities;
    let position = candidates
        .iter()
        .position(|a| covers_required(a, required))
        .unwrap_or(0);
    let agent = candidates.swap_remove(position);

    debug!(task = %request.task, agent_id = %agent.id(), fallback, "Selected agent");
    Some(Selection { agent, fallback })
}

fn covers_required(agent: &RegisteredAgent, required: &[String]) -> bool {
    match call_guarded(|| agent.handler().capabilities().covers(required)) {
        Ok(covered) => covered,
        Err(message) => {
            warn!(agent_id = %agent.id(), error = %message, "Agent capabilities unavailable");
            false
        }
    }
}
