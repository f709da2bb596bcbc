//! Search criteria for the agent registry.

use serde::{Deserialize, Serialize};

use super::{AgentType, RegisteredAgent};

/// Agent search criteria.
///
/// Fields combine with AND; within each list any entry matches. Ids in
/// `excluded` are always filtered out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentQuery {
    /// Case-insensitive substring of the name or description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Any of these types.
    #[serde(default)]
    pub types: Vec<AgentType>,
    /// Any of these specializations.
    #[serde(default)]
    pub specializations: Vec<String>,
    /// Any of these capabilities.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Any of these tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Agent ids to leave out.
    #[serde(default)]
    pub excluded: Vec<String>,
}

impl AgentQuery {
    /// Create an empty query that matches every agent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by name or description substring.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add an accepted type.
    pub fn agent_type(mut self, agent_type: AgentType) -> Self {
        self.types.push(agent_type);
        self
    }

    /// Add an accepted specialization.
    pub fn specialization(mut self, specialization: impl Into<String>) -> Self {
        self.specializations.push(specialization.into());
        self
    }

    /// Add an accepted capability.
    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Add an accepted tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Exclude an agent id.
    pub fn exclude(mut self, agent_id: impl Into<String>) -> Self {
        self.excluded.push(agent_id.into());
        self
    }

    /// Check whether an agent satisfies every provided criterion.
    pub fn matches(&self, agent: &RegisteredAgent) -> bool {
        let schema = agent.schema();

        if self.excluded.iter().any(|id| id == &schema.id) {
            return false;
        }

        if let Some(name) = &self.name {
            let needle = name.to_lowercase();
            if !schema.name.to_lowercase().contains(&needle)
                && !schema.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if !self.types.is_empty() && !self.types.contains(&schema.agent_type) {
            return false;
        }

        any_of(&self.specializations, &schema.specializations)
            && any_of(&self.capabilities, &schema.capabilities)
            && any_of(&self.tags, &schema.tags)
    }
}

/// An empty filter accepts everything; otherwise one shared entry is enough.
fn any_of(wanted: &[String], present: &[String]) -> bool {
    wanted.is_empty() || wanted.iter().any(|w| present.contains(w))
}
