// error.rs — Error types for the goal lifecycle engine.

use thiserror::Error;

use crate::goal::GoalId;

/// Errors that can occur during goal lifecycle operations.
///
/// Every variant is raised before any mutation is applied, so an `Err`
/// always leaves the goal set and the priority cache untouched.
#[derive(Debug, Error)]
pub enum GoalError {
    /// Missing or out-of-range input (ratings, recurrence, pause condition,
    /// status target).
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested goal was not found.
    #[error("goal not found: {0}")]
    NotFound(GoalId),

    /// Invalid status transition.
    #[error("invalid transition from {from} to {to} for goal {goal_id}")]
    InvalidTransition {
        goal_id: GoalId,
        from: String,
        to: String,
    },

    /// An operation would break a structural invariant (e.g. a goal pausing
    /// on itself).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize goal data.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The settings file could not be parsed or holds unusable values.
    #[error("configuration error: {0}")]
    Config(String),
}
