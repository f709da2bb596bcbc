//! Tool definition types.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{validate_common, EntryKind, RegistryError, RegistryResult};

/// Category of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// File system access.
    File,
    /// Remote API calls.
    Api,
    /// Data transformation and storage.
    Data,
    /// Pure computation.
    Computation,
    /// Messaging and notifications.
    Communication,
    /// Analysis and inspection.
    Analysis,
    /// Content generation.
    Creative,
    /// Anything else.
    Utility,
}

impl ToolCategory {
    /// All categories, in declaration order.
    pub const ALL: [ToolCategory; 8] = [
        ToolCategory::File,
        ToolCategory::Api,
        ToolCategory::Data,
        ToolCategory::Computation,
        ToolCategory::Communication,
        ToolCategory::Analysis,
        ToolCategory::Creative,
        ToolCategory::Utility,
    ];

    /// Get the string representation of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::File => "file",
            ToolCategory::Api => "api",
            ToolCategory::Data => "data",
            ToolCategory::Computation => "computation",
            ToolCategory::Communication => "communication",
            ToolCategory::Analysis => "analysis",
            ToolCategory::Creative => "creative",
            ToolCategory::Utility => "utility",
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ToolCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        ToolCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| format!("Invalid tool category: {}", s))
    }
}

/// Declared type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// A string.
    String,
    /// Any JSON number.
    Number,
    /// A boolean.
    Boolean,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
}

impl ParameterType {
    /// Whether a JSON value has this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParameterType::String => value.is_string(),
            ParameterType::Number => value.is_number(),
            ParameterType::Boolean => value.is_boolean(),
            ParameterType::Object => value.is_object(),
            ParameterType::Array => value.is_array(),
        }
    }
}

/// A single declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolParameter {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Whether callers must supply it.
    #[serde(default)]
    pub required: bool,
    /// Value used when the parameter is omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

impl ToolParameter {
    /// Create a required parameter.
    pub fn required(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            default: None,
            description: String::new(),
        }
    }

    /// Create an optional parameter.
    pub fn optional(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type)
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Request budget per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    /// Requests allowed per period.
    pub requests: u32,
    /// Period length in milliseconds.
    pub period_ms: u64,
}

/// Static description of a tool.
///
/// # Example
///
/// ```
/// use agentreg::tools::{ParameterType, ToolCategory, ToolDefinition, ToolParameter};
///
/// let def = ToolDefinition::new("csv.parse", "CSV parser", "Parse CSV text", ToolCategory::Data)
///     .with_parameter(ToolParameter::required("text", ParameterType::String))
///     .with_tag("tabular")
///     .with_cost(0.01);
///
/// assert!(def.validate().is_ok());
/// assert_eq!(def.required_parameters().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// Category used for indexing.
    pub category: ToolCategory,
    /// Definition version.
    pub version: String,
    /// Declared parameters, in order.
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    /// Unit cost per invocation.
    #[serde(default)]
    pub cost: f64,
    /// Advisory timeout in milliseconds.
    pub timeout_ms: u64,
    /// Optional rate limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    /// Permission tags. Not enforced by the registry.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Ids of tools that must be registered first.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ToolDefinition {
    /// Default advisory timeout for tools.
    pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

    /// Create a definition with version `1.0.0`, zero cost and the default timeout.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: ToolCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            category,
            version: "1.0.0".to_string(),
            parameters: Vec::new(),
            cost: 0.0,
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            rate_limit: None,
            permissions: Vec::new(),
            dependencies: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Append a parameter.
    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set the unit cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Set the advisory timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the rate limit.
    pub fn with_rate_limit(mut self, requests: u32, period_ms: u64) -> Self {
        self.rate_limit = Some(RateLimit {
            requests,
            period_ms,
        });
        self
    }

    /// Append a permission tag.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Append a dependency.
    pub fn with_dependency(mut self, tool_id: impl Into<String>) -> Self {
        self.dependencies.push(tool_id.into());
        self
    }

    /// Append a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Whether the definition carries the tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Iterate over required parameters.
    pub fn required_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }

    /// Check the definition's structural invariants.
    ///
    /// Validation never modifies the definition.
    pub fn validate(&self) -> RegistryResult<()> {
        let kind = EntryKind::Tool;
        validate_common(kind, &self.id, &self.name, &self.version)?;

        let mut seen = HashSet::new();
        for param in &self.parameters {
            if param.name.trim().is_empty() {
                return Err(RegistryError::invalid_definition(
                    kind,
                    &self.id,
                    "parameter names must not be empty",
                ));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(RegistryError::invalid_definition(
                    kind,
                    &self.id,
                    format!("duplicate parameter '{}'", param.name),
                ));
            }
        }

        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(RegistryError::invalid_definition(
                kind,
                &self.id,
                "cost must be a non-negative number",
            ));
        }

        if self.timeout_ms == 0 {
            return Err(RegistryError::invalid_definition(
                kind,
                &self.id,
                "timeout must be greater than zero",
            ));
        }

        if let Some(limit) = &self.rate_limit {
            if limit.requests == 0 || limit.period_ms == 0 {
                return Err(RegistryError::invalid_definition(
                    kind,
                    &self.id,
                    "rate limit needs a positive request count and period",
                ));
            }
        }

        Ok(())
    }
}
