// goal.rs — Goal: the central entity of the tracker.
//
// A Goal carries the user's ratings (motivation, urgency), an optional
// deadline, its lifecycle status, an optional pause condition, an optional
// recurrence rule, and the review cadence bookkeeping.
//
// The status graph:
//   Inactive ⇄ Active
//   Inactive/Active → Paused → Inactive (or Active via force)
//   Inactive/Active/Paused → Completed | NotCompleted
//   Completed/NotCompleted → Inactive (explicit reactivation)
//
// Status fields are only written by `GoalManager`; this module supplies the
// data types and the transition table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GoalError;

/// Lowest valid motivation/urgency rating.
pub const MIN_RATING: u8 = 1;

/// Highest valid motivation/urgency rating.
pub const MAX_RATING: u8 = 5;

/// Opaque, immutable goal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(pub Uuid);

impl GoalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GoalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GoalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(GoalId)
    }
}

/// Motivation and urgency, both in `MIN_RATING..=MAX_RATING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub motivation: u8,
    pub urgency: u8,
}

impl Ratings {
    /// Build a validated rating pair.
    pub fn new(motivation: u8, urgency: u8) -> Result<Self, GoalError> {
        let ratings = Self {
            motivation,
            urgency,
        };
        ratings.validate()?;
        Ok(ratings)
    }

    pub fn validate(&self) -> Result<(), GoalError> {
        for (name, value) in [("motivation", self.motivation), ("urgency", self.urgency)] {
            if !(MIN_RATING..=MAX_RATING).contains(&value) {
                return Err(GoalError::Validation(format!(
                    "{name} must be between {MIN_RATING} and {MAX_RATING}, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// The lifecycle status of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Currently being worked on; counts against the active-goal cap.
    Active,

    /// Waiting for a free slot; competes on priority in auto-activation.
    Inactive,

    /// Withheld from auto-activation until its pause condition resolves.
    Paused,

    /// Finished successfully.
    Completed,

    /// Given up on, or the occurrence lapsed.
    NotCompleted,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalStatus::Active => write!(f, "active"),
            GoalStatus::Inactive => write!(f, "inactive"),
            GoalStatus::Paused => write!(f, "paused"),
            GoalStatus::Completed => write!(f, "completed"),
            GoalStatus::NotCompleted => write!(f, "not_completed"),
        }
    }
}

impl FromStr for GoalStatus {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GoalStatus::Active),
            "inactive" => Ok(GoalStatus::Inactive),
            "paused" => Ok(GoalStatus::Paused),
            "completed" => Ok(GoalStatus::Completed),
            "not_completed" | "notCompleted" => Ok(GoalStatus::NotCompleted),
            other => Err(GoalError::Validation(format!("unknown goal status: {other}"))),
        }
    }
}

impl GoalStatus {
    /// `Completed` and `NotCompleted` are terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GoalStatus::Completed | GoalStatus::NotCompleted)
    }

    /// Check whether moving from this status to `next` is a legal edge.
    ///
    /// `Paused → Paused` is allowed so a pause condition can be replaced.
    pub fn can_transition_to(&self, next: GoalStatus) -> bool {
        use GoalStatus::*;
        matches!(
            (*self, next),
            (Inactive | Paused, Active)
                | (Active | Paused | Completed | NotCompleted, Inactive)
                | (Active | Inactive | Paused, Paused)
                | (Active | Inactive | Paused, Completed | NotCompleted)
        )
    }
}

/// Why a paused goal is withheld from auto-activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PauseCondition {
    /// Withheld until this point in time has passed.
    Until(DateTime<Utc>),

    /// Withheld until the referenced goal is deleted or reaches a terminal
    /// status.
    UntilGoal(GoalId),
}

impl fmt::Display for PauseCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PauseCondition::Until(at) => write!(f, "until {}", at.to_rfc3339()),
            PauseCondition::UntilGoal(id) => write!(f, "until goal {id} is resolved"),
        }
    }
}

/// Unit of a recurrence period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurUnit {
    Days,
    Weeks,
    Months,
}

impl fmt::Display for RecurUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurUnit::Days => write!(f, "days"),
            RecurUnit::Weeks => write!(f, "weeks"),
            RecurUnit::Months => write!(f, "months"),
        }
    }
}

impl FromStr for RecurUnit {
    type Err = GoalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" | "days" => Ok(RecurUnit::Days),
            "week" | "weeks" => Ok(RecurUnit::Weeks),
            "month" | "months" => Ok(RecurUnit::Months),
            other => Err(GoalError::Validation(format!(
                "unknown recurrence unit: {other} (expected days, weeks or months)"
            ))),
        }
    }
}

/// "Every `period` `unit`s".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub period: u32,
    pub unit: RecurUnit,
}

impl RecurrenceRule {
    pub fn new(period: u32, unit: RecurUnit) -> Result<Self, GoalError> {
        let rule = Self { period, unit };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<(), GoalError> {
        if self.period == 0 {
            return Err(GoalError::Validation(
                "recurrence period must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    /// The next occurrence after `from`. Months are calendar months (the day
    /// is clamped to the end of shorter months). `None` on date overflow.
    pub fn next_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let period = i64::from(self.period);
        match self.unit {
            RecurUnit::Days => from.checked_add_signed(Duration::try_days(period)?),
            RecurUnit::Weeks => from.checked_add_signed(Duration::try_weeks(period)?),
            RecurUnit::Months => from.checked_add_months(Months::new(self.period)),
        }
    }
}

/// A tracked goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,

    /// Creation order; the tie-break among equal priorities.
    pub seq: u64,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current ratings. Also the snapshot a review is compared against.
    pub ratings: Ratings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,

    pub status: GoalStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause: Option<PauseCondition>,

    /// Set while the goal is active through an explicit override rather than
    /// an auto-activation pass.
    #[serde(default)]
    pub force_activated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,

    #[serde(default)]
    pub recur_count: u32,

    #[serde(default)]
    pub completion_count: u32,

    #[serde(default)]
    pub not_completed_count: u32,

    /// Index into the configured review interval sequence.
    #[serde(default)]
    pub review_interval_index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub last_updated: DateTime<Utc>,
}

impl Goal {
    /// Build an `Inactive` goal from a creation request.
    pub fn from_request(request: NewGoal, seq: u64, now: DateTime<Utc>) -> Result<Self, GoalError> {
        let goal = Self {
            id: GoalId::new(),
            seq,
            title: request.title,
            description: request.description,
            ratings: request.ratings,
            deadline: request.deadline,
            status: GoalStatus::Inactive,
            pause: None,
            force_activated: false,
            recurrence: request.recurrence,
            recur_count: 0,
            completion_count: 0,
            not_completed_count: 0,
            review_interval_index: 0,
            last_reviewed_at: None,
            created_at: now,
            last_updated: now,
        };
        goal.validate()?;
        Ok(goal)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// The goal this one waits on, if paused on another goal.
    pub fn paused_on(&self) -> Option<GoalId> {
        match self.pause {
            Some(PauseCondition::UntilGoal(id)) => Some(id),
            _ => None,
        }
    }

    /// Check the entity invariants that do not depend on other goals.
    pub fn validate(&self) -> Result<(), GoalError> {
        if self.title.trim().is_empty() {
            return Err(GoalError::Validation("goal title must not be empty".to_string()));
        }
        self.ratings.validate()?;
        if let Some(rule) = &self.recurrence {
            rule.validate()?;
        }
        if self.paused_on() == Some(self.id) {
            return Err(GoalError::InvariantViolation(format!(
                "goal {} cannot be paused on itself",
                self.id
            )));
        }
        Ok(())
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = now;
    }
}

/// A creation request.
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub ratings: Ratings,
    pub deadline: Option<DateTime<Utc>>,
    pub recurrence: Option<RecurrenceRule>,
}

impl NewGoal {
    pub fn new(title: impl Into<String>, ratings: Ratings) -> Self {
        Self {
            title: title.into(),
            description: None,
            ratings,
            deadline: None,
            recurrence: None,
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A partial update of the user-editable fields.
///
/// `Some(None)` on a doubly-optional field clears it.
#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub motivation: Option<u8>,
    pub urgency: Option<u8>,
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub recurrence: Option<Option<RecurrenceRule>>,
}

impl GoalPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.motivation.is_none()
            && self.urgency.is_none()
            && self.deadline.is_none()
            && self.recurrence.is_none()
    }

    /// Whether applying this patch can change the goal's priority.
    pub fn affects_priority(&self) -> bool {
        self.motivation.is_some() || self.urgency.is_some() || self.deadline.is_some()
    }

    /// Merge into `goal`. The caller validates the result.
    pub(crate) fn apply_to(&self, goal: &mut Goal) {
        if let Some(title) = &self.title {
            goal.title = title.clone();
        }
        if let Some(description) = &self.description {
            goal.description = description.clone();
        }
        if let Some(motivation) = self.motivation {
            goal.ratings.motivation = motivation;
        }
        if let Some(urgency) = self.urgency {
            goal.ratings.urgency = urgency;
        }
        if let Some(deadline) = self.deadline {
            goal.deadline = deadline;
        }
        if let Some(recurrence) = self.recurrence {
            goal.recurrence = recurrence;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_goal() -> Goal {
        Goal::from_request(
            NewGoal::new("Run a marathon", Ratings::new(4, 2).unwrap()),
            0,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn new_goal_starts_inactive() {
        let goal = test_goal();
        assert_eq!(goal.status, GoalStatus::Inactive);
        assert!(goal.pause.is_none());
        assert_eq!(goal.review_interval_index, 0);
        assert_eq!(goal.created_at, goal.last_updated);
    }

    #[test]
    fn ratings_outside_bounds_are_rejected() {
        assert!(matches!(Ratings::new(0, 3), Err(GoalError::Validation(_))));
        assert!(matches!(Ratings::new(3, 6), Err(GoalError::Validation(_))));
        assert!(Ratings::new(MIN_RATING, MAX_RATING).is_ok());
    }

    #[test]
    fn from_request_rejects_bad_ratings() {
        let request = NewGoal::new(
            "Bad",
            Ratings {
                motivation: 9,
                urgency: 1,
            },
        );
        assert!(matches!(
            Goal::from_request(request, 0, Utc::now()),
            Err(GoalError::Validation(_))
        ));
    }

    #[test]
    fn from_request_rejects_blank_title() {
        let request = NewGoal::new("   ", Ratings::new(3, 3).unwrap());
        assert!(Goal::from_request(request, 0, Utc::now()).is_err());
    }

    #[test]
    fn self_pause_is_an_invariant_violation() {
        let mut goal = test_goal();
        goal.pause = Some(PauseCondition::UntilGoal(goal.id));
        assert!(matches!(
            goal.validate(),
            Err(GoalError::InvariantViolation(_))
        ));
    }

    #[test]
    fn zero_recurrence_period_rejected() {
        assert!(RecurrenceRule::new(0, RecurUnit::Days).is_err());
    }

    #[test]
    fn terminal_states_only_reopen_to_inactive() {
        for terminal in [GoalStatus::Completed, GoalStatus::NotCompleted] {
            assert!(terminal.is_terminal());
            assert!(terminal.can_transition_to(GoalStatus::Inactive));
            assert!(!terminal.can_transition_to(GoalStatus::Active));
            assert!(!terminal.can_transition_to(GoalStatus::Paused));
            assert!(!terminal.can_transition_to(GoalStatus::Completed));
        }
    }

    #[test]
    fn inactive_cannot_transition_to_itself() {
        assert!(!GoalStatus::Inactive.can_transition_to(GoalStatus::Inactive));
        assert!(!GoalStatus::Active.can_transition_to(GoalStatus::Active));
        assert!(GoalStatus::Paused.can_transition_to(GoalStatus::Paused));
    }

    #[test]
    fn status_display_and_parse_agree() {
        for status in [
            GoalStatus::Active,
            GoalStatus::Inactive,
            GoalStatus::Paused,
            GoalStatus::Completed,
            GoalStatus::NotCompleted,
        ] {
            assert_eq!(status.to_string().parse::<GoalStatus>().unwrap(), status);
        }
        assert!("done".parse::<GoalStatus>().is_err());
    }

    #[test]
    fn recurrence_next_after_days_weeks_months() {
        let from = Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap();
        let days = RecurrenceRule::new(7, RecurUnit::Days).unwrap();
        let weeks = RecurrenceRule::new(2, RecurUnit::Weeks).unwrap();
        let months = RecurrenceRule::new(1, RecurUnit::Months).unwrap();

        assert_eq!(
            days.next_after(from).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 7, 9, 0, 0).unwrap()
        );
        assert_eq!(
            weeks.next_after(from).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 14, 9, 0, 0).unwrap()
        );
        // Clamped to the last day of February in a leap year.
        assert_eq!(
            months.next_after(from).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn patch_merges_only_given_fields() {
        let mut goal = test_goal();
        let deadline = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let patch = GoalPatch {
            urgency: Some(5),
            deadline: Some(Some(deadline)),
            ..Default::default()
        };
        assert!(patch.affects_priority());
        patch.apply_to(&mut goal);
        assert_eq!(goal.ratings, Ratings::new(4, 5).unwrap());
        assert_eq!(goal.deadline, Some(deadline));
        assert_eq!(goal.title, "Run a marathon");

        let clear = GoalPatch {
            deadline: Some(None),
            ..Default::default()
        };
        clear.apply_to(&mut goal);
        assert!(goal.deadline.is_none());
    }

    #[test]
    fn title_only_patch_does_not_affect_priority() {
        let patch = GoalPatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(!patch.affects_priority());
        assert!(!patch.is_empty());
        assert!(GoalPatch::default().is_empty());
    }

    #[test]
    fn serialization_round_trip_with_pause_and_recurrence() {
        let mut goal = test_goal();
        let other = GoalId::new();
        goal.status = GoalStatus::Paused;
        goal.pause = Some(PauseCondition::UntilGoal(other));
        goal.recurrence = Some(RecurrenceRule::new(3, RecurUnit::Weeks).unwrap());

        let json = serde_json::to_string_pretty(&goal).unwrap();
        assert!(json.contains("\"until_goal\""));
        assert!(json.contains("\"paused\""));
        let restored: Goal = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id, goal.id);
        assert_eq!(restored.pause, Some(PauseCondition::UntilGoal(other)));
        assert_eq!(restored.recurrence, goal.recurrence);
    }

    #[test]
    fn optional_fields_omitted_from_json() {
        let goal = test_goal();
        let json = serde_json::to_string(&goal).unwrap();
        assert!(!json.contains("deadline"));
        assert!(!json.contains("pause\""));
        assert!(!json.contains("recurrence"));
    }
}
