//! Shared registry layer.
//!
//! Holds what the tool and agent registries have in common: the error
//! taxonomy, running usage statistics, definition id validation and the
//! guarded handler invocation that turns handler errors and panics into
//! failed results.
//!
//! ## Usage
//!
//! ```rust
//! use agentreg::registry::{StatsStrategy, UsageStats};
//!
//! let mut stats = UsageStats::default();
//! stats.record(12.0, true, StatsStrategy::Approximate);
//! stats.record(18.0, false, StatsStrategy::Approximate);
//!
//! assert_eq!(stats.usage_count, 2);
//! assert_eq!(stats.success_rate, 0.5);
//! assert_eq!(stats.average_execution_time_ms, 15.0);
//! ```

mod error;
mod usage;

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use futures_util::FutureExt;

pub use error::{EntryKind, RegistryError, RegistryResult};
pub use usage::{StatsStrategy, UsageStats};

/// Untyped key/value payload passed to handlers.
///
/// This is the only dynamically typed data in the crate; handlers validate it
/// into their own types inside `validate_parameters` / `validate_task`.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Validate a definition id.
///
/// Ids must be non-empty and contain only alphanumeric characters,
/// underscores, hyphens, dots or colons.
pub(crate) fn validate_id(kind: EntryKind, id: &str) -> RegistryResult<()> {
    if id.is_empty() {
        return Err(RegistryError::invalid_definition(kind, id, "id must not be empty"));
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
    {
        return Err(RegistryError::invalid_definition(
            kind,
            id,
            "id may only contain alphanumeric characters, '_', '-', '.' or ':'",
        ));
    }

    Ok(())
}

/// Validate the fields every definition carries.
pub(crate) fn validate_common(
    kind: EntryKind,
    id: &str,
    name: &str,
    version: &str,
) -> RegistryResult<()> {
    validate_id(kind, id)?;
    if name.trim().is_empty() {
        return Err(RegistryError::invalid_definition(kind, id, "name must not be empty"));
    }
    if version.trim().is_empty() {
        return Err(RegistryError::invalid_definition(kind, id, "version must not be empty"));
    }
    Ok(())
}

/// Outcome of a guarded handler call.
pub(crate) struct Invocation<T> {
    /// The handler's value, or a description of why it failed.
    pub(crate) outcome: Result<T, String>,
    /// Wall-clock time of the call in milliseconds.
    pub(crate) elapsed_ms: f64,
}

/// Await a handler future, timing it and converting errors and panics into
/// an error message.
pub(crate) async fn invoke_guarded<T, F>(future: F) -> Invocation<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let start = Instant::now();
    let outcome = match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(format!("{:#}", err)),
        Err(panic) => Err(panic_message(panic.as_ref())),
    };

    Invocation {
        outcome,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    }
}

/// Run a synchronous handler hook, converting a panic into an error message.
pub(crate) fn call_guarded<T>(hook: impl FnOnce() -> T) -> Result<T, String> {
    std::panic::catch_unwind(AssertUnwindSafe(hook))
        .map_err(|panic| panic_message(panic.as_ref()))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {}", msg)
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("handler panicked: {}", msg)
    } else {
        "handler panicked".to_string()
    }
}

/// Acquire a read guard, recovering the data from a poisoned lock.
pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Acquire a write guard, recovering the data from a poisoned lock.
pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
