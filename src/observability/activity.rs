//! Markdown activity log for registry and orchestration events.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::orchestration::{
    OrchestrationResult, OrchestrationSession, SessionObserver, SystemStatistics,
};
use crate::registry::{EntryKind, Parameters};

/// Severity of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActivityLevel {
    /// Verbose detail such as request parameters.
    Debug,
    /// Normal activity.
    Info,
    /// Unsuccessful but expected outcomes.
    Warn,
    /// Errors.
    Error,
}

impl std::str::FromStr for ActivityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "DEBUG" | "TRACE" => Ok(ActivityLevel::Debug),
            "INFO" => Ok(ActivityLevel::Info),
            "WARN" | "WARNING" => Ok(ActivityLevel::Warn),
            "ERROR" => Ok(ActivityLevel::Error),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", s)),
        }
    }
}

/// Activity log for registry and orchestration events.
///
/// Writes markdown entries to a file: session starts and finishes,
/// registrations, errors and statistics snapshots. Entries below the
/// configured level are skipped. Register it with
/// [`RegistryOrchestrator::add_observer`](crate::orchestration::RegistryOrchestrator::add_observer)
/// to record sessions automatically.
#[derive(Debug)]
pub struct ActivityLog {
    log_file: PathBuf,
    log_level: String,
    threshold: ActivityLevel,
    write_guard: Mutex<()>,
}

impl ActivityLog {
    /// Initialize the activity log.
    ///
    /// # Arguments
    /// * `log_file` - Path to log file. If None, creates a timestamped file in temp directory.
    /// * `log_level` - Logging level (defaults to "INFO").
    pub fn new(log_file: Option<&Path>, log_level: Option<&str>) -> Result<Self> {
        let log_file = match log_file {
            Some(p) => p.to_path_buf(),
            None => std::env::temp_dir().join("agentreg").join(format!(
                "agentreg_{}_{}.md",
                Utc::now().timestamp_millis(),
                std::process::id()
            )),
        };

        let log_level = log_level.unwrap_or("INFO").to_string();
        let threshold = log_level.parse()?;

        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let log = Self {
            log_file,
            log_level,
            threshold,
            write_guard: Mutex::new(()),
        };

        if !log.log_file.exists() {
            log.initialize_log_file()?;
        }

        Ok(log)
    }

    fn initialize_log_file(&self) -> Result<()> {
        let mut file = File::create(&self.log_file)
            .with_context(|| format!("Failed to create log file: {}", self.log_file.display()))?;

        let now: DateTime<Utc> = Utc::now();

        writeln!(file, "# Agent Registry Activity Log\n")?;
        writeln!(file, "Log started: {}\n", now.to_rfc3339())?;
        writeln!(file, "---\n")?;

        Ok(())
    }

    fn enabled(&self, level: ActivityLevel) -> bool {
        level >= self.threshold
    }

    fn append_to_log(&self, level: ActivityLevel, content: &str) -> Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }

        let _guard = self.write_guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .with_context(|| format!("Failed to open log file: {}", self.log_file.display()))?;

        write!(file, "{}", content).with_context(|| "Failed to write to log file")?;

        Ok(())
    }

    /// Log session start.
    pub fn log_session_start(&self, session: &OrchestrationSession) -> Result<()> {
        let mut content = format!(
            "## Session Started - {}\n\n**Session:** {}\n**Task:** {}\n**User:** {}\n\n",
            session.started_at.to_rfc3339(),
            session.id,
            session.request.task,
            session.user_id.as_deref().unwrap_or("anonymous"),
        );

        if self.enabled(ActivityLevel::Debug) && !session.request.parameters.is_empty() {
            content.push_str(&format!(
                "**Parameters:**\n```json\n{}\n```\n\n",
                serde_json::to_string_pretty(&session.request.parameters).unwrap_or_default()
            ));
        }

        self.append_to_log(ActivityLevel::Info, &content)
    }

    /// Log session completion or failure.
    pub fn log_session_finish(
        &self,
        session: &OrchestrationSession,
        result: &OrchestrationResult,
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let mut content = format!(
            "### Session {} - {}\n\n**Session:** {}\n**Agent:** {}\n**Execution Time:** {} ms\n**Cost:** {}\n",
            session.status,
            now.to_rfc3339(),
            session.id,
            session.agent_id.as_deref().unwrap_or("none"),
            result.execution_time_ms,
            result.cost,
        );

        if !result.metadata.tools_used.is_empty() {
            content.push_str(&format!(
                "**Tools:** {}\n",
                result.metadata.tools_used.join(", ")
            ));
        }
        if let Some(error) = &result.error {
            content.push_str(&format!("**Error:** {}\n", error));
        }
        content.push_str("\n---\n\n");

        let level = if result.success {
            ActivityLevel::Info
        } else {
            ActivityLevel::Warn
        };
        self.append_to_log(level, &content)
    }

    /// Log a registration.
    pub fn log_registration(&self, kind: EntryKind, id: &str) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Registered {} - {}\n\n**Id:** {}\n\n",
            kind,
            now.to_rfc3339(),
            id
        );
        self.append_to_log(ActivityLevel::Info, &content)
    }

    /// Log error with context.
    ///
    /// # Arguments
    /// * `error` - Error message.
    /// * `context` - Additional context information.
    pub fn log_error(&self, error: &str, context: Option<&Parameters>) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let mut content = format!(
            "### Error - {}\n\n**Error:** {}\n\n",
            now.to_rfc3339(),
            error
        );

        if let Some(ctx) = context {
            content.push_str(&format!(
                "**Context:** {}\n\n",
                serde_json::to_string_pretty(ctx).unwrap_or_default()
            ));
        }

        self.append_to_log(ActivityLevel::Error, &content)
    }

    /// Log a statistics snapshot.
    pub fn log_statistics(&self, statistics: &SystemStatistics) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Statistics - {}\n\n```json\n{}\n```\n\n",
            now.to_rfc3339(),
            serde_json::to_string_pretty(statistics).context("Failed to serialize statistics")?
        );
        self.append_to_log(ActivityLevel::Info, &content)
    }

    /// Get the log file path.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Get the log level.
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

impl SessionObserver for ActivityLog {
    fn on_session_started(&self, session: &OrchestrationSession) {
        if let Err(e) = self.log_session_start(session) {
            warn!(error = %e, "Failed to write activity log");
        }
    }

    fn on_session_finished(&self, session: &OrchestrationSession, result: &OrchestrationResult) {
        if let Err(e) = self.log_session_finish(session, result) {
            warn!(error = %e, "Failed to write activity log");
        }
    }

    fn on_registered(&self, kind: EntryKind, id: &str) {
        if let Err(e) = self.log_registration(kind, id) {
            warn!(error = %e, "Failed to write activity log");
        }
    }

    fn on_registration_failed(&self, kind: EntryKind, id: &str, error: &str) {
        let mut context = Parameters::new();
        context.insert("kind".to_string(), kind.as_str().into());
        context.insert("id".to_string(), id.into());
        if let Err(e) = self.log_error(error, Some(&context)) {
            warn!(error = %e, "Failed to write activity log");
        }
    }
}
