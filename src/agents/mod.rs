//! Agent Registry
//!
//! Agents are stateful handlers with an initialize/cleanup lifecycle. The
//! registry validates schemas, runs the lifecycle hooks on register and
//! unregister, executes agents, and keeps per-agent session memory together
//! with session, timing, success and cost statistics.

mod definition;
mod handler;
mod query;
mod registered;
mod registry;

pub use definition::{AgentSchema, AgentType};
pub use handler::{AgentCapabilities, AgentContext, AgentHandler, AgentResult, Priority};
pub use query::AgentQuery;
pub use registered::{memory_key, AgentMetadata, AgentStatistics, MemoryEntry, RegisteredAgent};
pub use registry::{AgentRegistry, AgentRegistryStatistics};
