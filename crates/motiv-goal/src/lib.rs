//! # motiv-goal
//!
//! Goal lifecycle, priority, and review scheduling engine for Motiv.
//!
//! A [`Goal`] carries motivation/urgency ratings, an optional deadline, and
//! optional recurrence. The [`GoalManager`] ranks goals by computed priority,
//! keeps at most a configured number of them `active`, handles pausing
//! (until a date or until another goal is resolved), re-arms recurring goals,
//! and adjusts each goal's review cadence from how stable its ratings are.
//!
//! ## Key components
//!
//! - [`Goal`] / [`GoalStatus`] — the entity and its status machine
//!   (Inactive ⇄ Active → Paused → Completed | NotCompleted)
//! - [`compute_priority`] — pure priority score
//! - [`PriorityCache`] — memoized priorities, invalidated on mutation
//! - [`GoalManager`] — every lifecycle operation plus auto-activation
//! - [`ReviewIntervals`] — the review cadence and its index rule
//! - [`GoalFileStore`] — JSON file-based persistence for goals
//! - [`Settings`] / [`MotivPaths`] — configuration and on-disk layout
//! - [`GoalEvent`] / [`EventDispatcher`] — lifecycle notifications

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod goal;
pub mod manager;
pub mod priority;
pub mod review;
pub mod store;

pub use cache::{PriorityCache, PriorityCacheEntry};
pub use config::{MotivPaths, Settings};
pub use error::GoalError;
pub use events::{EventDispatcher, GoalEvent, LogSink, NotificationSink};
pub use goal::{
    Goal, GoalId, GoalPatch, GoalStatus, NewGoal, PauseCondition, Ratings, RecurUnit,
    RecurrenceRule, MAX_RATING, MIN_RATING,
};
pub use manager::GoalManager;
pub use priority::compute_priority;
pub use review::{
    is_review_due, next_interval_index, review_due_at, ReviewIntervals, ReviewOutcome,
};
pub use store::GoalFileStore;
