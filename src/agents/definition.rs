//! Agent schema types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{validate_common, EntryKind, RegistryResult};

/// Role of an agent.
///
/// The built-in roles cover the common cases; any other string is kept as
/// [`AgentType::Custom`] so new roles do not need a crate release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentType {
    /// Generic agent, also used as the selection fallback.
    Utility,
    /// Narrow domain expert.
    Specialist,
    /// Coordinates other agents.
    Orchestrator,
    /// Generates content.
    Creative,
    /// Analyses data.
    Analytical,
    /// Handles messaging.
    Communicator,
    /// Any other role.
    Custom(String),
}

impl AgentType {
    /// Get the string representation of the type.
    pub fn as_str(&self) -> &str {
        match self {
            AgentType::Utility => "utility",
            AgentType::Specialist => "specialist",
            AgentType::Orchestrator => "orchestrator",
            AgentType::Creative => "creative",
            AgentType::Analytical => "analytical",
            AgentType::Communicator => "communicator",
            AgentType::Custom(name) => name,
        }
    }
}

impl From<String> for AgentType {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "utility" => AgentType::Utility,
            "specialist" => AgentType::Specialist,
            "orchestrator" => AgentType::Orchestrator,
            "creative" => AgentType::Creative,
            "analytical" => AgentType::Analytical,
            "communicator" => AgentType::Communicator,
            _ => AgentType::Custom(value),
        }
    }
}

impl From<&str> for AgentType {
    fn from(value: &str) -> Self {
        AgentType::from(value.to_string())
    }
}

impl From<AgentType> for String {
    fn from(value: AgentType) -> Self {
        match value {
            AgentType::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl FromStr for AgentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AgentType::from(s))
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static description of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSchema {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the agent does.
    #[serde(default)]
    pub description: String,
    /// Role of the agent.
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    /// Domains the agent specialises in.
    #[serde(default)]
    pub specializations: Vec<String>,
    /// Task names the agent can take, used for selection.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Tool ids the agent expects to use. Advisory only.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Opaque model provider descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Value>,
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Ids of agents that must be registered first.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl AgentSchema {
    /// Create a schema with version `1.0.0`.
    pub fn new(id: impl Into<String>, name: impl Into<String>, agent_type: AgentType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            agent_type,
            specializations: Vec::new(),
            capabilities: Vec::new(),
            tags: Vec::new(),
            tools: Vec::new(),
            model: None,
            version: default_version(),
            dependencies: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a capability.
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Append a specialization.
    pub fn with_specialization(mut self, specialization: impl Into<String>) -> Self {
        self.specializations.push(specialization.into());
        self
    }

    /// Append a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Append an advisory tool id.
    pub fn with_tool(mut self, tool_id: impl Into<String>) -> Self {
        self.tools.push(tool_id.into());
        self
    }

    /// Set the model descriptor.
    pub fn with_model(mut self, model: Value) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Append a dependency.
    pub fn with_dependency(mut self, agent_id: impl Into<String>) -> Self {
        self.dependencies.push(agent_id.into());
        self
    }

    /// Whether the agent declares the capability.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Whether the agent declares the specialization.
    pub fn has_specialization(&self, specialization: &str) -> bool {
        self.specializations.iter().any(|s| s == specialization)
    }

    /// Check the schema's structural invariants without modifying it.
    pub fn validate(&self) -> RegistryResult<()> {
        validate_common(EntryKind::Agent, &self.id, &self.name, &self.version)
    }
}
