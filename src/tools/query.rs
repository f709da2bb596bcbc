//! Search criteria for the tool registry.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ToolCategory, ToolInstance};
use crate::registry::call_guarded;

/// Tool search criteria.
///
/// Fields combine with AND; within `tags` any tag matches. Unset fields and
/// an empty tag list do not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolQuery {
    /// Exact category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ToolCategory>,
    /// Any of these tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Case-insensitive substring of the name or description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Capability reported by the handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
}

impl ToolQuery {
    /// Create an empty query that matches every tool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by category.
    pub fn category(mut self, category: ToolCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Add an accepted tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Filter by name or description substring.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Filter by handler capability.
    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    /// Check whether a tool satisfies every provided criterion.
    pub fn matches(&self, tool: &ToolInstance) -> bool {
        let def = tool.definition();

        if let Some(category) = self.category {
            if def.category != category {
                return false;
            }
        }

        if !self.tags.is_empty() && !self.tags.iter().any(|t| def.has_tag(t)) {
            return false;
        }

        if let Some(name) = &self.name {
            let needle = name.to_lowercase();
            if !def.name.to_lowercase().contains(&needle)
                && !def.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if let Some(capability) = &self.capability {
            let supported = call_guarded(|| tool.handler().capabilities().supports(capability));
            match supported {
                Ok(true) => {}
                Ok(false) => return false,
                Err(message) => {
                    warn!(tool_id = %tool.id(), error = %message, "Tool capabilities unavailable");
                    return false;
                }
            }
        }

        true
    }
}
