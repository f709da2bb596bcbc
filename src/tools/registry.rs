//! Thread-safe tool registry with dependency validation and usage tracking.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{
    ToolCategory, ToolContext, ToolDefinition, ToolHandler, ToolInstance, ToolQuery, ToolResult,
    ToolStatistics,
};
use crate::registry::{
    call_guarded, invoke_guarded, read_lock, write_lock, EntryKind, RegistryError, RegistryResult,
    StatsStrategy,
};

/// Internal state of the registry.
#[derive(Debug, Default)]
struct ToolRegistryInner {
    /// All registered tools, in registration order.
    tools: Vec<ToolInstance>,

    /// Index from tool id to position in the tools vector.
    id_index: HashMap<String, usize>,

    /// Tool ids per category.
    category_index: HashMap<ToolCategory, Vec<String>>,

    /// Tool ids per tag.
    tag_index: HashMap<String, Vec<String>>,
}

impl ToolRegistryInner {
    fn get(&self, id: &str) -> Option<&ToolInstance> {
        self.id_index.get(id).map(|&idx| &self.tools[idx])
    }

    fn resolve(&self, ids: Option<&Vec<String>>) -> Vec<ToolInstance> {
        ids.map(|ids| ids.iter().filter_map(|id| self.get(id).cloned()).collect())
            .unwrap_or_default()
    }
}

/// Aggregate statistics of a tool registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRegistryStatistics {
    /// Number of registered tools.
    pub total_tools: usize,
    /// Number of distinct categories in use.
    pub categories: usize,
    /// Tool count per category.
    pub by_category: BTreeMap<ToolCategory, usize>,
    /// Sum of all usage counts.
    pub total_usage: u64,
    /// Mean success rate over all tools; zero for an empty registry.
    pub average_success_rate: f64,
    /// Tool with the highest usage count.
    pub most_used_tool: Option<String>,
}

/// Thread-safe registry of tools.
///
/// The registry is wrapped in `Arc<RwLock<...>>` internally, so clones share
/// the same state. Locks are never held across a handler call.
///
/// # Example
///
/// ```rust
/// use agentreg::tools::{ToolCategory, ToolContext, ToolDefinition, ToolHandler, ToolRegistry, ToolResult};
/// use agentreg::registry::Parameters;
/// use async_trait::async_trait;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// struct Echo;
///
/// #[async_trait]
/// impl ToolHandler for Echo {
///     async fn execute(&self, ctx: &ToolContext) -> anyhow::Result<ToolResult> {
///         Ok(ToolResult::ok(json!(ctx.parameters)))
///     }
/// }
///
/// # tokio_test_block(async {
/// let registry = ToolRegistry::new();
/// let def = ToolDefinition::new("echo", "Echo", "Echo the parameters", ToolCategory::Utility);
/// registry.register_tool(def, Arc::new(Echo)).unwrap();
///
/// let result = registry.execute_tool(&ToolContext::new("echo", Parameters::new())).await.unwrap();
/// assert!(result.success);
/// assert_eq!(registry.get_tool("echo").unwrap().usage().usage_count, 1);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    inner: Arc<RwLock<ToolRegistryInner>>,
    strategy: StatsStrategy,
}

impl ToolRegistry {
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

    /// Register a tool.
    ///
    /// Fails if the definition is invalid, if the id is taken, or if any
    /// dependency is not registered yet. Returns the tool id.
    pub fn register_tool(
        &self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> RegistryResult<String> {
        definition.validate()?;

        let mut inner = write_lock(&self.inner);

        if inner.id_index.contains_key(&definition.id) {
            return Err(RegistryError::duplicate(EntryKind::Tool, definition.id));
        }

        if let Some(missing) = definition
            .dependencies
            .iter()
            .find(|dep| !inner.id_index.contains_key(*dep))
        {
            return Err(RegistryError::missing_dependency(
                EntryKind::Tool,
                &definition.id,
                missing,
            ));
        }

        let id = definition.id.clone();
        inner
            .category_index
            .entry(definition.category)
            .or_default()
            .push(id.clone());
        for tag in &definition.tags {
            let ids = inner.tag_index.entry(tag.clone()).or_default();
            if !ids.contains(&id) {
                ids.push(id.clone());
            }
        }

        let idx = inner.tools.len();
        inner.id_index.insert(id.clone(), idx);
        inner.tools.push(ToolInstance::new(definition, handler));

        info!(tool_id = %id, "Registered tool");
        Ok(id)
    }

    /// Unregister a tool.
    ///
    /// Returns `Ok(false)` if the tool is not registered, and
    /// `DependentsExist` if other tools still depend on it.
    pub fn unregister_tool(&self, tool_id: &str) -> RegistryResult<bool> {
        let mut inner = write_lock(&self.inner);

        let Some(&idx) = inner.id_index.get(tool_id) else {
            return Ok(false);
        };

        let dependents: Vec<String> = inner
            .tools
            .iter()
            .filter(|t| t.definition().dependencies.iter().any(|d| d == tool_id))
            .map(|t| t.id().to_string())
            .collect();
        if !dependents.is_empty() {
            return Err(RegistryError::DependentsExist {
                id: tool_id.to_string(),
                dependents,
            });
        }

        inner.id_index.remove(tool_id);
        let removed = inner.tools.remove(idx);

        // Update all indices that were shifted
        for index in inner.id_index.values_mut() {
            if *index > idx {
                *index -= 1;
            }
        }

        if let Some(ids) = inner.category_index.get_mut(&removed.category()) {
            ids.retain(|id| id != tool_id);
        }
        for tag in &removed.definition().tags {
            if let Some(ids) = inner.tag_index.get_mut(tag) {
                ids.retain(|id| id != tool_id);
                if ids.is_empty() {
                    inner.tag_index.remove(tag);
                }
            }
        }

        info!(tool_id, "Unregistered tool");
        Ok(true)
    }

    /// Get a snapshot of a tool.
    pub fn get_tool(&self, tool_id: &str) -> Option<ToolInstance> {
        read_lock(&self.inner).get(tool_id).cloned()
    }

    /// List all tools in registration order.
    pub fn list_tools(&self) -> Vec<ToolInstance> {
        read_lock(&self.inner).tools.clone()
    }

    /// List tools of one category.
    pub fn list_tools_by_category(&self, category: ToolCategory) -> Vec<ToolInstance> {
        let inner = read_lock(&self.inner);
        inner.resolve(inner.category_index.get(&category))
    }

    /// List tools carrying a tag.
    pub fn list_tools_by_tag(&self, tag: &str) -> Vec<ToolInstance> {
        let inner = read_lock(&self.inner);
        inner.resolve(inner.tag_index.get(tag))
    }

    /// Search tools.
    pub fn search_tools(&self, query: &ToolQuery) -> Vec<ToolInstance> {
        read_lock(&self.inner)
            .tools
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect()
    }

    /// Check if a tool with the given id exists.
    pub fn contains(&self, tool_id: &str) -> bool {
        read_lock(&self.inner).id_index.contains_key(tool_id)
    }

    /// Get the total number of registered tools.
    pub fn len(&self) -> usize {
        read_lock(&self.inner).tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Execute a tool.
    ///
    /// Returns `ToolNotFound` or `InvalidParameters` before the handler runs.
    /// A parameter validator that panics counts as a rejection.
    /// Once the handler is invoked, usage is recorded whatever the outcome, and
    /// handler errors or panics come back as a failed result.
    pub async fn execute_tool(&self, context: &ToolContext) -> RegistryResult<ToolResult> {
        let handler = read_lock(&self.inner)
            .get(&context.tool_id)
            .map(|t| Arc::clone(t.handler()))
            .ok_or_else(|| RegistryError::ToolNotFound(context.tool_id.clone()))?;

        match call_guarded(|| handler.validate_parameters(&context.parameters)) {
            Ok(true) => {}
            Ok(false) => {
                warn!(tool_id = %context.tool_id, "Tool rejected parameters");
                return Err(RegistryError::InvalidParameters {
                    id: context.tool_id.clone(),
                });
            }
            Err(message) => {
                warn!(tool_id = %context.tool_id, error = %message, "Parameter validation failed");
                return Err(RegistryError::InvalidParameters {
                    id: context.tool_id.clone(),
                });
            }
        }

        debug!(tool_id = %context.tool_id, session_id = ?context.session_id, "Executing tool");
        let invocation = invoke_guarded(handler.execute(context)).await;

        let mut result = match invocation.outcome {
            Ok(result) => result,
            Err(message) => {
                warn!(tool_id = %context.tool_id, error = %message, "Tool execution failed");
                ToolResult::failed(message)
            }
        };
        result.execution_time_ms = invocation.elapsed_ms.round() as u64;

        self.record_usage(&context.tool_id, invocation.elapsed_ms, result.success);
        Ok(result)
    }

    fn record_usage(&self, tool_id: &str, elapsed_ms: f64, success: bool) {
        let mut inner = write_lock(&self.inner);
        match inner.id_index.get(tool_id).copied() {
            Some(idx) => inner.tools[idx]
                .usage_mut()
                .record(elapsed_ms, success, self.strategy),
            None => debug!(tool_id, "Tool unregistered during execution; usage dropped"),
        }
    }

    /// Usage statistics of one tool.
    pub fn get_tool_statistics(&self, tool_id: &str) -> Option<ToolStatistics> {
        read_lock(&self.inner).get(tool_id).map(ToolInstance::statistics)
    }

    /// Aggregate statistics of the registry.
    pub fn get_registry_statistics(&self) -> ToolRegistryStatistics {
        let inner = read_lock(&self.inner);

        let mut by_category = BTreeMap::new();
        for tool in &inner.tools {
            *by_category.entry(tool.category()).or_insert(0) += 1;
        }

        let total_tools = inner.tools.len();
        let total_usage = inner.tools.iter().map(|t| t.usage().usage_count).sum();
        let average_success_rate = if total_tools == 0 {
            0.0
        } else {
            inner.tools.iter().map(|t| t.usage().success_rate).sum::<f64>() / total_tools as f64
        };

        let mut most_used: Option<&ToolInstance> = None;
        for tool in &inner.tools {
            let count = tool.usage().usage_count;
            if count > 0 && most_used.map_or(true, |m| count > m.usage().usage_count) {
                most_used = Some(tool);
            }
        }

        ToolRegistryStatistics {
            total_tools,
            categories: by_category.len(),
            by_category,
            total_usage,
            average_success_rate,
            most_used_tool: most_used.map(|t| t.id().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Parameters;
    use crate::tools::ToolCapabilities;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticTool {
        succeed: bool,
        caps: ToolCapabilities,
    }

    impl StaticTool {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                succeed: true,
                caps: Default::default(),
            })
        }
    }

    #[async_trait]
    impl ToolHandler for StaticTool {
        async fn execute(&self, _context: &ToolContext) -> anyhow::Result<ToolResult> {
            if self.succeed {
                Ok(ToolResult::ok(json!("done")))
            } else {
                Err(anyhow::anyhow!("backend unavailable"))
            }
        }

        fn validate_parameters(&self, parameters: &Parameters) -> bool {
            !parameters.contains_key("reject")
        }

        fn capabilities(&self) -> ToolCapabilities {
            self.caps.clone()
        }
    }

    fn def(id: &str, category: ToolCategory) -> ToolDefinition {
        ToolDefinition::new(id, format!("Tool {}", id), format!("Does {}", id), category)
    }

    #[test]
    fn test_register_and_get() {
        let registry = ToolRegistry::new();
        let input = def("a", ToolCategory::Data).with_tag("x");
        let id = registry.register_tool(input.clone(), StaticTool::ok()).unwrap();

        assert_eq!(id, "a");
        assert_eq!(registry.get_tool("a").unwrap().definition(), &input);
        assert!(registry.get_tool("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = ToolRegistry::new();
        registry.register_tool(def("dup", ToolCategory::Api), StaticTool::ok()).unwrap();
        let err = registry
            .register_tool(def("dup", ToolCategory::File), StaticTool::ok())
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { kind: EntryKind::Tool, .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_dependency_rejected() {
        let registry = ToolRegistry::new();
        let err = registry
            .register_tool(def("b", ToolCategory::Api).with_dependency("a"), StaticTool::ok())
            .unwrap_err();
        match err {
            RegistryError::MissingDependency { dependency, .. } => assert_eq!(dependency, "a"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_updates_indices() {
        let registry = ToolRegistry::new();
        registry.register_tool(def("a", ToolCategory::Data).with_tag("t"), StaticTool::ok()).unwrap();
        registry.register_tool(def("b", ToolCategory::Data).with_tag("t"), StaticTool::ok()).unwrap();
        registry.register_tool(def("c", ToolCategory::File), StaticTool::ok()).unwrap();

        assert!(registry.unregister_tool("a").unwrap());
        assert!(!registry.unregister_tool("a").unwrap());

        let data: Vec<_> = registry
            .list_tools_by_category(ToolCategory::Data)
            .iter()
            .map(|t| t.id().to_string())
            .collect();
        assert_eq!(data, vec!["b"]);
        assert_eq!(registry.list_tools_by_tag("t").len(), 1);
        assert_eq!(registry.get_tool("c").unwrap().id(), "c");
    }

    #[test]
    fn test_search_by_name_is_case_insensitive() {
        let registry = ToolRegistry::new();
        registry
            .register_tool(
                ToolDefinition::new("q", "Query", "Runs SQL against the warehouse", ToolCategory::Data),
                StaticTool::ok(),
            )
            .unwrap();

        assert_eq!(registry.search_tools(&ToolQuery::new().name("sql")).len(), 1);
        assert_eq!(registry.search_tools(&ToolQuery::new().name("QUERY")).len(), 1);
        assert!(registry.search_tools(&ToolQuery::new().name("ftp")).is_empty());
    }

    #[test]
    fn test_search_by_capability() {
        let registry = ToolRegistry::new();
        registry
            .register_tool(
                def("stream", ToolCategory::Api),
                Arc::new(StaticTool {
                    succeed: true,
                    caps: ToolCapabilities {
                        streaming: true,
                        ..Default::default()
                    },
                }),
            )
            .unwrap();
        registry.register_tool(def("plain", ToolCategory::Api), StaticTool::ok()).unwrap();

        let found = registry.search_tools(&ToolQuery::new().capability("streaming"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), "stream");

        // An enabled flag matches capabilities it does not name
        let found = registry.search_tools(&ToolQuery::new().capability("pdf"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), "stream");
    }

    struct PanickingTool;

    #[async_trait]
    impl ToolHandler for PanickingTool {
        async fn execute(&self, _context: &ToolContext) -> anyhow::Result<ToolResult> {
            Ok(ToolResult::ok(json!("unreachable")))
        }

        fn validate_parameters(&self, _parameters: &Parameters) -> bool {
            panic!("validator broke")
        }

        fn capabilities(&self) -> ToolCapabilities {
            panic!("capabilities broke")
        }
    }

    #[tokio::test]
    async fn test_panicking_validator_rejects_parameters() {
        let registry = ToolRegistry::new();
        registry.register_tool(def("broken", ToolCategory::Api), Arc::new(PanickingTool)).unwrap();

        let err = registry
            .execute_tool(&ToolContext::new("broken", Parameters::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidParameters { id } if id == "broken"));
        assert_eq!(registry.get_tool_statistics("broken").unwrap().usage_count, 0);
    }

    #[test]
    fn test_panicking_capabilities_never_match() {
        let registry = ToolRegistry::new();
        registry.register_tool(def("broken", ToolCategory::Api), Arc::new(PanickingTool)).unwrap();
        registry
            .register_tool(
                def("batch", ToolCategory::Api),
                Arc::new(StaticTool {
                    succeed: true,
                    caps: ToolCapabilities {
                        batch: true,
                        ..Default::default()
                    },
                }),
            )
            .unwrap();

        let found = registry.search_tools(&ToolQuery::new().capability("batch"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), "batch");
        // Queries without a capability never ask the handler
        assert_eq!(registry.search_tools(&ToolQuery::new()).len(), 2);
    }

    #[tokio::test]
    async fn test_execute_records_failure() {
        let registry = ToolRegistry::new();
        registry
            .register_tool(
                def("flaky", ToolCategory::Api),
                Arc::new(StaticTool {
                    succeed: false,
                    caps: Default::default(),
                }),
            )
            .unwrap();

        let result = registry
            .execute_tool(&ToolContext::new("flaky", Parameters::new()))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("backend unavailable"));

        let stats = registry.get_tool_statistics("flaky").unwrap();
        assert_eq!(stats.usage_count, 1);
        assert_eq!(stats.success_rate, 0.0);
        assert!(stats.last_used.is_some());
    }

    #[tokio::test]
    async fn test_execute_rejects_unknown_and_invalid() {
        let registry = ToolRegistry::new();
        registry.register_tool(def("t", ToolCategory::Utility), StaticTool::ok()).unwrap();

        let err = registry
            .execute_tool(&ToolContext::new("nope", Parameters::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::ToolNotFound(_)));

        let mut params = Parameters::new();
        params.insert("reject".to_string(), json!(true));
        let err = registry.execute_tool(&ToolContext::new("t", params)).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidParameters { .. }));
        assert_eq!(registry.get_tool_statistics("t").unwrap().usage_count, 0);
    }

    #[tokio::test]
    async fn test_registry_statistics() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.get_registry_statistics(), ToolRegistryStatistics::default());

        registry.register_tool(def("a", ToolCategory::Data), StaticTool::ok()).unwrap();
        registry.register_tool(def("b", ToolCategory::File), StaticTool::ok()).unwrap();
        registry.register_tool(def("c", ToolCategory::File), StaticTool::ok()).unwrap();
        assert_eq!(registry.get_registry_statistics().most_used_tool, None);

        for _ in 0..2 {
            registry.execute_tool(&ToolContext::new("b", Parameters::new())).await.unwrap();
        }

        let stats = registry.get_registry_statistics();
        assert_eq!(stats.total_tools, 3);
        assert_eq!(stats.categories, 2);
        assert_eq!(stats.by_category[&ToolCategory::File], 2);
        assert_eq!(stats.total_usage, 2);
        assert_eq!(stats.most_used_tool.as_deref(), Some("b"));
        assert!((stats.average_success_rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_thread_safety() {
        use std::thread;

        let registry = ToolRegistry::new();
        let registry_clone = registry.clone();

        let handle = thread::spawn(move || {
            registry_clone
                .register_tool(def("from_thread", ToolCategory::Utility), StaticTool::ok())
                .unwrap();
        });

        registry.register_tool(def("from_main", ToolCategory::Utility), StaticTool::ok()).unwrap();
        handle.join().unwrap();

        assert_eq!(registry.len(), 2);
    }
}
