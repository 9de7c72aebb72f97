// review.rs — Review cadence: interval configuration and the index rule.
//
// Each goal points into an ascending sequence of day counts. A review whose
// ratings match the stored ones moves the goal one step further along the
// sequence (saturating at the end); a review with different ratings sends
// it back to the first interval.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GoalError;
use crate::goal::Goal;

/// Interval sequence used when settings don't supply one.
pub const DEFAULT_REVIEW_INTERVALS: [u32; 7] = [1, 2, 4, 7, 14, 30, 60];

/// Ascending, deduplicated, non-empty sequence of positive day counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct ReviewIntervals(Vec<u32>);

impl ReviewIntervals {
    /// Sort and deduplicate `days`. Rejects empty input and zero entries.
    pub fn new(mut days: Vec<u32>) -> Result<Self, GoalError> {
        if days.is_empty() {
            return Err(GoalError::Config(
                "review intervals must contain at least one entry".to_string(),
            ));
        }
        if days.contains(&0) {
            return Err(GoalError::Config(
                "review intervals must be positive day counts".to_string(),
            ));
        }
        days.sort_unstable();
        days.dedup();
        Ok(Self(days))
    }

    pub fn days(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.0.len() - 1
    }

    /// Clamp an index that may predate a shorter configuration.
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.last_index())
    }

    /// Day count at `index`, clamped.
    pub fn days_at(&self, index: usize) -> u32 {
        self.0[self.clamp_index(index)]
    }
}

impl Default for ReviewIntervals {
    fn default() -> Self {
        Self(DEFAULT_REVIEW_INTERVALS.to_vec())
    }
}

impl TryFrom<Vec<u32>> for ReviewIntervals {
    type Error = GoalError;

    fn try_from(days: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<ReviewIntervals> for Vec<u32> {
    fn from(intervals: ReviewIntervals) -> Self {
        intervals.0
    }
}

/// The index transition rule.
pub fn next_interval_index(current: usize, ratings_match: bool, intervals: &ReviewIntervals) -> usize {
    if ratings_match {
        intervals.clamp_index(current.saturating_add(1))
    } else {
        0
    }
}

/// When `goal` is next due for re-rating.
///
/// Counted from the last review, or from creation if never reviewed.
/// Saturates at the latest representable instant for very long intervals.
pub fn review_due_at(goal: &Goal, intervals: &ReviewIntervals) -> DateTime<Utc> {
    let anchor = goal.last_reviewed_at.unwrap_or(goal.created_at);
    let days = i64::from(intervals.days_at(goal.review_interval_index));
    Duration::try_days(days)
        .and_then(|span| anchor.checked_add_signed(span))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Whether `goal` should be re-rated at `now`. Terminal goals never are.
pub fn is_review_due(goal: &Goal, intervals: &ReviewIntervals, now: DateTime<Utc>) -> bool {
    !goal.status.is_terminal() && review_due_at(goal, intervals) <= now
}

/// Result of recording a review.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// The goal after the review was applied.
    pub goal: Goal,
    /// Whether the submitted ratings equalled the stored ones.
    pub ratings_match: bool,
}
