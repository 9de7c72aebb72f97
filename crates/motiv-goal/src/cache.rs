// cache.rs — PriorityCache: memoized priority scores keyed by goal id.
//
// Entries are computed lazily on read and marked stale by `invalidate`.
// Reads go through `&self` (interior mutability) so display code can consult
// the cache without holding the manager mutably; only `GoalManager` calls
// the invalidation methods.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::goal::{Goal, GoalId};
use crate::priority::compute_priority;

/// Score returned for ids that no longer resolve to a goal.
pub const MISSING_PRIORITY: f64 = 0.0;

/// Last computed priority of one goal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityCacheEntry {
    pub priority: f64,
    pub valid: bool,
}

/// Memoization layer over [`compute_priority`].
#[derive(Debug, Default)]
pub struct PriorityCache {
    entries: RefCell<HashMap<GoalId, PriorityCacheEntry>>,
}

impl PriorityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached priority of `goal_id`, recomputing if stale or absent.
    ///
    /// Returns [`MISSING_PRIORITY`] if the id is not in `goals`.
    pub fn get_priority(&self, goal_id: GoalId, goals: &[Goal], now: DateTime<Utc>) -> f64 {
        match goals.iter().find(|g| g.id == goal_id) {
            Some(goal) => self.priority_of(goal, now),
            None => {
                tracing::debug!(%goal_id, "priority requested for unknown goal");
                MISSING_PRIORITY
            }
        }
    }

    /// Priorities of every goal in `goals`, filling the cache as it goes.
    pub fn get_all_priorities(&self, goals: &[Goal], now: DateTime<Utc>) -> HashMap<GoalId, f64> {
        goals
            .iter()
            .map(|goal| (goal.id, self.priority_of(goal, now)))
            .collect()
    }

    /// Cached priority of a goal the caller already holds.
    pub fn priority_of(&self, goal: &Goal, now: DateTime<Utc>) -> f64 {
        let mut entries = self.entries.borrow_mut();
        if let Some(entry) = entries.get(&goal.id) {
            if entry.valid {
                return entry.priority;
            }
        }
        let priority = compute_priority(goal, now);
        tracing::debug!(goal_id = %goal.id, priority, "recomputed priority");
        entries.insert(
            goal.id,
            PriorityCacheEntry {
                priority,
                valid: true,
            },
        );
        priority
    }

    /// Mark one entry stale; the next read recomputes it.
    pub fn invalidate(&self, goal_id: GoalId) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(&goal_id) {
            entry.valid = false;
        }
    }

    /// Drop the entry for a deleted goal.
    pub fn forget(&self, goal_id: GoalId) {
        self.entries.borrow_mut().remove(&goal_id);
    }

    /// Invalidate everything.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// The raw entry, if any. Exposed for inspection in tests and tooling.
    pub fn entry(&self, goal_id: GoalId) -> Option<PriorityCacheEntry> {
        self.entries.borrow().get(&goal_id).copied()
    }
}
