//! Orchestration sessions and their observers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrchestrationRequest, OrchestrationResult};
use crate::registry::EntryKind;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created, no agent chosen yet.
    Initializing,
    /// Agent running.
    Executing,
    /// Finished; the agent returned a result.
    Completed,
    /// Finished without a usable result.
    Failed,
}

impl SessionStatus {
    /// Completed and failed sessions never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }

    /// Whether moving to `next` is allowed.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (*self, next),
            (Initializing, Executing)
                | (Initializing, Failed)
                | (Executing, Completed)
                | (Executing, Failed)
        )
    }

    /// Get the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Initializing => "initializing",
            SessionStatus::Executing => "executing",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One orchestrated task or workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationSession {
    /// UUID v4.
    pub id: String,
    /// The originating request.
    pub request: OrchestrationRequest,
    /// Calling user, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Chosen agent; unset until selection succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Current state.
    pub status: SessionStatus,
    /// Creation time.
    pub started_at: DateTime<Utc>,
    /// Time the session reached a terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Retry counter. Never incremented by the orchestrator itself.
    #[serde(default)]
    pub retries: u32,
    /// Last recorded error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl OrchestrationSession {
    /// Start a new session for a request.
    pub fn new(request: OrchestrationRequest, user_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            request,
            user_id,
            agent_id: None,
            status: SessionStatus::Initializing,
            started_at: Utc::now(),
            completed_at: None,
            retries: 0,
            last_error: None,
        }
    }

    /// Whether the session has finished.
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `next`. Returns false, leaving the session untouched, if the
    /// transition is not allowed.
    pub fn transition(&mut self, next: SessionStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        true
    }

    /// Mark the session failed with an error.
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        let moved = self.transition(SessionStatus::Failed);
        if moved {
            self.last_error = Some(error.into());
        }
        moved
    }
}

/// Receives session and registration events from the orchestrator.
///
/// Callbacks run synchronously on the orchestrating task and must not block.
pub trait SessionObserver: Send + Sync {
    /// A session was created.
    fn on_session_started(&self, _session: &OrchestrationSession) {}

    /// A session reached a terminal state.
    fn on_session_finished(&self, _session: &OrchestrationSession, _result: &OrchestrationResult) {}

    /// A tool or agent was registered through the orchestrator.
    fn on_registered(&self, _kind: EntryKind, _id: &str) {}

    /// A registration through the orchestrator was rejected.
    fn on_registration_failed(&self, _kind: EntryKind, _id: &str, _error: &str) {}
}
