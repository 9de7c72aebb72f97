// events.rs — Lifecycle events and notification dispatch.
//
// GoalManager emits an event after every successful mutation. Sinks decide
// what to do with them; the always-on sink appends JSONL to a file so the
// history of a goal set can be inspected with jq or grep.
//
// Dispatch is synchronous and best-effort: a failing sink is logged and
// never fails the lifecycle operation that produced the event.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GoalError;
use crate::goal::{GoalId, GoalStatus};

/// Events emitted at key lifecycle points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GoalEvent {
    /// A new goal was created.
    GoalCreated {
        goal_id: GoalId,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// User-editable fields of a goal changed.
    GoalUpdated {
        goal_id: GoalId,
        timestamp: DateTime<Utc>,
    },

    /// A goal was deleted.
    GoalDeleted {
        goal_id: GoalId,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// A goal changed status.
    StatusChanged {
        goal_id: GoalId,
        from: GoalStatus,
        to: GoalStatus,
        timestamp: DateTime<Utc>,
    },

    /// A recurring goal was resolved and re-armed for its next occurrence.
    GoalRecurred {
        goal_id: GoalId,
        outcome: GoalStatus,
        recur_count: u32,
        next_occurrence: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// A goal was re-rated.
    ReviewRecorded {
        goal_id: GoalId,
        ratings_match: bool,
        review_interval_index: usize,
        timestamp: DateTime<Utc>,
    },
}

impl GoalEvent {
    /// Get the event type name as a string.
    pub fn event_type(&self) -> &str {
        match self {
            GoalEvent::GoalCreated { .. } => "goal_created",
            GoalEvent::GoalUpdated { .. } => "goal_updated",
            GoalEvent::GoalDeleted { .. } => "goal_deleted",
            GoalEvent::StatusChanged { .. } => "status_changed",
            GoalEvent::GoalRecurred { .. } => "goal_recurred",
            GoalEvent::ReviewRecorded { .. } => "review_recorded",
        }
    }

    pub fn goal_id(&self) -> GoalId {
        match self {
            GoalEvent::GoalCreated { goal_id, .. }
            | GoalEvent::GoalUpdated { goal_id, .. }
            | GoalEvent::GoalDeleted { goal_id, .. }
            | GoalEvent::StatusChanged { goal_id, .. }
            | GoalEvent::GoalRecurred { goal_id, .. }
            | GoalEvent::ReviewRecorded { goal_id, .. } => *goal_id,
        }
    }

    pub fn status_changed(goal_id: GoalId, from: GoalStatus, to: GoalStatus) -> Self {
        GoalEvent::StatusChanged {
            goal_id,
            from,
            to,
            timestamp: Utc::now(),
        }
    }
}

/// Trait for receiving lifecycle events.
pub trait NotificationSink: Send {
    /// Handle an event. Errors are logged but don't stop the system.
    fn send(&self, event: &GoalEvent) -> Result<(), GoalError>;
}

/// Logs events as JSONL to a file.
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl NotificationSink for LogSink {
    fn send(&self, event: &GoalEvent) -> Result<(), GoalError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| GoalError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| GoalError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json).map_err(|source| GoalError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(())
    }
}

/// Dispatches events to multiple sinks.
#[derive(Default)]
pub struct EventDispatcher {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sinks.push(sink);
    }

    pub fn dispatch(&self, event: &GoalEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(event) {
                tracing::warn!("notification sink error: {}", e);
            }
        }
    }
}
