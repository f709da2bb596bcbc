//! Tool handler contract and the values exchanged with it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::Parameters;

/// What a tool handler can do, as reported to search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCapabilities {
    /// Produces incremental output.
    #[serde(default)]
    pub streaming: bool,
    /// Accepts batched inputs.
    #[serde(default)]
    pub batch: bool,
    /// Can be cancelled mid-flight.
    #[serde(default)]
    pub cancellation: bool,
    /// Formats the tool consumes or produces (e.g. `json`, `csv`).
    #[serde(default)]
    pub supported_formats: Vec<String>,
    /// Additional named capability flags.
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
}

impl ToolCapabilities {
    /// Add a supported format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.supported_formats.push(format.into());
        self
    }

    /// Set a named capability flag.
    pub fn with_feature(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.features.insert(name.into(), enabled);
        self
    }

    /// Whether the tool matches a capability query.
    ///
    /// Any enabled boolean flag (`streaming`, `batch`, `cancellation` or a
    /// feature set to `true`) matches every capability. Otherwise the
    /// capability must be listed among the supported formats.
    pub fn supports(&self, capability: &str) -> bool {
        self.has_enabled_flag() || self.supported_formats.iter().any(|f| f == capability)
    }

    fn has_enabled_flag(&self) -> bool {
        self.streaming || self.batch || self.cancellation || self.features.values().any(|on| *on)
    }
}

/// Input handed to a tool handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolContext {
    /// Id of the tool to run.
    pub tool_id: String,
    /// Call parameters.
    #[serde(default)]
    pub parameters: Parameters,
    /// Session on whose behalf the tool runs, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Calling user, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Advisory timeout; the registry does not enforce it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl ToolContext {
    /// Create a context for the given tool.
    pub fn new(tool_id: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            tool_id: tool_id.into(),
            parameters,
            ..Default::default()
        }
    }

    /// Attach a session id.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach a user id.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Output of a tool execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    /// Whether the tool succeeded.
    pub success: bool,
    /// Result payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Measured execution time; filled in by the registry.
    #[serde(default)]
    pub execution_time_ms: u64,
    /// Cost incurred, if the handler reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Handler-specific metadata.
    #[serde(default)]
    pub metadata: Parameters,
}

impl ToolResult {
    /// A successful result carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            ..Default::default()
        }
    }

    /// A failed result carrying `error`.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Set the cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }
}

/// Trait implemented by tool bodies.
///
/// Handlers may return an error or even panic; the registry converts both
/// into a failed [`ToolResult`] and still records the execution.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool.
    async fn execute(&self, context: &ToolContext) -> anyhow::Result<ToolResult>;

    /// Check the parameters before execution. Returning `false` makes the
    /// registry reject the call with `InvalidParameters`.
    fn validate_parameters(&self, _parameters: &Parameters) -> bool {
        true
    }

    /// Describe what the handler supports.
    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_supports_nothing_by_default() {
        let caps = ToolCapabilities::default();
        assert!(!caps.supports("streaming"));
        assert!(!caps.supports("pdf"));
    }

    #[test]
    fn test_any_enabled_flag_matches_every_capability() {
        let caps = ToolCapabilities {
            streaming: true,
            ..Default::default()
        };
        assert!(caps.supports("streaming"));
        assert!(caps.supports("batch"));
        assert!(caps.supports("pdf"));

        let caps = ToolCapabilities::default().with_feature("ocr", true);
        assert!(caps.supports("translation"));
    }

    #[test]
    fn test_supports_formats_without_flags() {
        let caps = ToolCapabilities::default()
            .with_format("csv")
            .with_feature("translation", false);

        assert!(caps.supports("csv"));
        assert!(!caps.supports("translation"));
        assert!(!caps.supports("pdf"));
    }

    #[test]
    fn test_result_constructors() {
        let ok = ToolResult::ok(json!({"rows": 3})).with_cost(0.5);
        assert!(ok.success);
        assert_eq!(ok.cost, Some(0.5));

        let failed = ToolResult::failed("disk full");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("disk full"));
    }

    #[test]
    fn test_context_builder() {
        let ctx = ToolContext::new("fs.read", Parameters::new())
            .with_session("s-1")
            .with_user("u-1");
        assert_eq!(ctx.session_id.as_deref(), Some("s-1"));
        assert_eq!(ctx.user_id.as_deref(), Some("u-1"));
        assert!(ctx.timeout_ms.is_none());
    }
}
