//! Tool Registry
//!
//! Stores tool definitions with their handlers, validates dependencies at
//! registration time, indexes tools by category and tag, and tracks per-tool
//! usage (count, running mean execution time, running success rate).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agentreg::tools::{ToolCategory, ToolDefinition, ToolQuery, ToolRegistry};
//!
//! let registry = ToolRegistry::new();
//! registry.register_tool(
//!     ToolDefinition::new("csv.parse", "CSV parser", "Parse CSV", ToolCategory::Data)
//!         .with_tag("analysis"),
//!     Arc::new(CsvParser),
//! )?;
//!
//! let hits = registry.search_tools(&ToolQuery::new().category(ToolCategory::Data).tag("analysis"));
//! ```

mod definition;
mod handler;
mod instance;
mod query;
mod registry;

pub use definition::{ParameterType, RateLimit, ToolCategory, ToolDefinition, ToolParameter};
pub use handler::{ToolCapabilities, ToolContext, ToolHandler, ToolResult};
pub use instance::{ToolInstance, ToolStatistics};
pub use query::ToolQuery;
pub use registry::{ToolRegistry, ToolRegistryStatistics};
