// priority.rs — Priority calculator.
//
// priority = motivation × urgency + deadline bonus
//
// The bonus is zero without a deadline and grows toward DEADLINE_WEIGHT as
// the deadline approaches, saturating once it is due or overdue. With
// ratings in 1..=5 the product ranges 1..=25, so a deadline can lift a goal
// past a slightly better-rated one but never past a much better-rated one.

use chrono::{DateTime, Utc};

use crate::goal::Goal;

/// Maximum bonus a deadline contributes (reached when due or overdue).
pub const DEADLINE_WEIGHT: f64 = 5.0;

/// Days-left value at which the bonus has halved.
pub const DEADLINE_HORIZON_DAYS: f64 = 7.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Compute a goal's priority score as of `now`.
///
/// Pure: the same goal and `now` always give the same score. Ratings are
/// assumed valid (they are checked when the goal is built or patched).
pub fn compute_priority(goal: &Goal, now: DateTime<Utc>) -> f64 {
    let base = f64::from(goal.ratings.motivation) * f64::from(goal.ratings.urgency);
    base + deadline_bonus(goal.deadline, now)
}

/// The deadline contribution to priority.
pub fn deadline_bonus(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(deadline) = deadline else {
        return 0.0;
    };
    let days_left = (deadline - now).num_seconds() as f64 / SECONDS_PER_DAY;
    if days_left <= 0.0 {
        return DEADLINE_WEIGHT;
    }
    DEADLINE_WEIGHT * DEADLINE_HORIZON_DAYS / (DEADLINE_HORIZON_DAYS + days_left)
}
