//! Error types shared by the tool and agent registries.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of registry entry an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A tool definition.
    Tool,
    /// An agent definition.
    Agent,
}

impl EntryKind {
    /// Get the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Tool => "tool",
            EntryKind::Agent => "agent",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during registry operations.
///
/// Registration errors (`DuplicateId`, `MissingDependency`, `DependentsExist`,
/// `InvalidDefinition`) are meant to surface at setup time. Execution paths only
/// return `ToolNotFound`, `AgentNotFound` and `InvalidParameters`; handler
/// failures are reported inside the result objects instead.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An entry with the same id is already registered.
    #[error("{kind} '{id}' is already registered")]
    DuplicateId {
        /// Kind of the conflicting entry.
        kind: EntryKind,
        /// The conflicting id.
        id: String,
    },

    /// A declared dependency is not registered.
    #[error("{kind} '{id}' depends on '{dependency}', which is not registered")]
    MissingDependency {
        /// Kind of the entry being registered.
        kind: EntryKind,
        /// Id of the entry being registered.
        id: String,
        /// The unresolved dependency id.
        dependency: String,
    },

    /// The tool cannot be removed while other tools depend on it.
    #[error("tool '{id}' is required by: {}", dependents.join(", "))]
    DependentsExist {
        /// Id of the tool that was to be removed.
        id: String,
        /// Ids of the tools that depend on it.
        dependents: Vec<String>,
    },

    /// The requested tool was not found.
    #[error("tool '{0}' not found")]
    ToolNotFound(String),

    /// The requested agent was not found.
    #[error("agent '{0}' not found")]
    AgentNotFound(String),

    /// The tool handler rejected the supplied parameters.
    #[error("invalid parameters for tool '{id}'")]
    InvalidParameters {
        /// Id of the tool.
        id: String,
    },

    /// The definition failed validation.
    #[error("invalid {kind} definition '{id}': {reason}")]
    InvalidDefinition {
        /// Kind of the definition.
        kind: EntryKind,
        /// Id of the definition (may be empty).
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The agent's `initialize` hook failed; nothing was registered.
    #[error("agent '{id}' failed to initialize: {message}")]
    InitializationFailed {
        /// Id of the agent.
        id: String,
        /// Error reported by the hook.
        message: String,
    },

    /// The agent's `cleanup` hook failed; the agent stays registered.
    #[error("agent '{id}' failed to clean up: {message}")]
    CleanupFailed {
        /// Id of the agent.
        id: String,
        /// Error reported by the hook.
        message: String,
    },
}

impl RegistryError {
    /// Create a DuplicateId error.
    pub fn duplicate(kind: EntryKind, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            kind,
            id: id.into(),
        }
    }

    /// Create a MissingDependency error.
    pub fn missing_dependency(
        kind: EntryKind,
        id: impl Into<String>,
        dependency: impl Into<String>,
    ) -> Self {
        Self::MissingDependency {
            kind,
            id: id.into(),
            dependency: dependency.into(),
        }
    }

    /// Create an InvalidDefinition error.
    pub fn invalid_definition(
        kind: EntryKind,
        id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidDefinition {
            kind,
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the registration taxonomy.
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateId { .. }
                | Self::MissingDependency { .. }
                | Self::DependentsExist { .. }
                | Self::InvalidDefinition { .. }
                | Self::InitializationFailed { .. }
        )
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
