// manager.rs — GoalManager: the owner of the goal set and its status machine.
//
// Every mutation goes through here. The pattern for each operation is:
//   1. resolve ids and validate the whole request (no mutation yet)
//   2. apply the change, touch `last_updated`, invalidate cache entries
//   3. cascade (release goals paused on a resolved goal)
//   4. run auto-activation against the caller's cap
//   5. emit lifecycle events
//
// Step 1 failing leaves the goal set and the cache untouched.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::cache::PriorityCache;
use crate::error::GoalError;
use crate::events::{EventDispatcher, GoalEvent};
use crate::goal::{Goal, GoalId, GoalPatch, GoalStatus, NewGoal, PauseCondition, Ratings};
use crate::review::{is_review_due, next_interval_index, ReviewIntervals, ReviewOutcome};

/// Owns the goals and the priority cache.
#[derive(Default)]
pub struct GoalManager {
    /// Kept in creation (`seq`) order.
    goals: Vec<Goal>,
    cache: PriorityCache,
    dispatcher: EventDispatcher,
    next_seq: u64,
}

impl GoalManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take over a previously persisted goal set.
    ///
    /// Goals are ordered by `seq`. Pause references to goals that are not in
    /// the set are treated as resolved.
    pub fn from_goals(mut goals: Vec<Goal>) -> Result<Self, GoalError> {
        goals.sort_by_key(|g| g.seq);

        let mut ids = HashSet::with_capacity(goals.len());
        for goal in &goals {
            goal.validate()?;
            if !ids.insert(goal.id) {
                return Err(GoalError::InvariantViolation(format!(
                    "duplicate goal id {}",
                    goal.id
                )));
            }
        }

        for goal in goals.iter_mut() {
            if let Some(target) = goal.paused_on() {
                if !ids.contains(&target) {
                    tracing::warn!(goal_id = %goal.id, %target, "dropping pause on missing goal");
                    goal.pause = None;
                    if goal.status == GoalStatus::Paused {
                        goal.status = GoalStatus::Inactive;
                    }
                }
            }
        }

        let next_seq = goals.last().map_or(0, |g| g.seq + 1);
        Ok(Self {
            goals,
            next_seq,
            ..Self::default()
        })
    }

    /// Attach the dispatcher that receives lifecycle events.
    pub fn with_dispatcher(mut self, dispatcher: EventDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    // ── Read side ──────────────────────────────────────────────

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn into_goals(self) -> Vec<Goal> {
        self.goals
    }

    pub fn goal(&self, id: GoalId) -> Result<&Goal, GoalError> {
        self.goals
            .iter()
            .find(|g| g.id == id)
            .ok_or(GoalError::NotFound(id))
    }

    pub fn cache(&self) -> &PriorityCache {
        &self.cache
    }

    /// Cached priority; 0.0 for unknown ids.
    pub fn priority(&self, id: GoalId) -> f64 {
        self.cache.get_priority(id, &self.goals, Utc::now())
    }

    pub fn all_priorities(&self) -> HashMap<GoalId, f64> {
        self.cache.get_all_priorities(&self.goals, Utc::now())
    }

    /// All goals, highest priority first; ties in creation order.
    pub fn goals_by_priority(&self) -> Vec<(&Goal, f64)> {
        let now = Utc::now();
        let mut ranked: Vec<(&Goal, f64)> = self
            .goals
            .iter()
            .map(|g| (g, self.cache.priority_of(g, now)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.seq.cmp(&b.0.seq)));
        ranked
    }

    pub fn active_count(&self) -> usize {
        self.goals
            .iter()
            .filter(|g| g.status == GoalStatus::Active)
            .count()
    }

    /// Non-terminal goals due for re-rating at `now`, oldest due date first.
    pub fn goals_due_for_review(&self, intervals: &ReviewIntervals, now: DateTime<Utc>) -> Vec<&Goal> {
        let mut due: Vec<&Goal> = self
            .goals
            .iter()
            .filter(|g| is_review_due(g, intervals, now))
            .collect();
        due.sort_by_key(|g| crate::review::review_due_at(g, intervals));
        due
    }

    // ── Lifecycle operations ───────────────────────────────────

    /// Create a goal and run auto-activation.
    pub fn create_goal(&mut self, request: NewGoal, max_active_goals: i64) -> Result<Goal, GoalError> {
        let now = Utc::now();
        let goal = Goal::from_request(request, self.next_seq, now)?;
        self.next_seq += 1;

        let id = goal.id;
        tracing::info!(goal_id = %id, title = %goal.title, "created goal");
        let event = GoalEvent::GoalCreated {
            goal_id: id,
            title: goal.title.clone(),
            timestamp: now,
        };
        self.goals.push(goal);
        self.emit(event);

        self.auto_activate_goals_by_priority(max_active_goals);
        self.snapshot(id)
    }

    /// Merge `patch` into a goal, re-validate, and re-run auto-activation.
    pub fn update_goal(
        &mut self,
        id: GoalId,
        patch: &GoalPatch,
        max_active_goals: i64,
    ) -> Result<Goal, GoalError> {
        let idx = self.index_of(id)?;
        let now = Utc::now();

        let mut candidate = self.goals[idx].clone();
        patch.apply_to(&mut candidate);
        candidate.validate()?;
        candidate.touch(now);

        self.goals[idx] = candidate;
        self.cache.invalidate(id);
        tracing::info!(goal_id = %id, "updated goal");
        self.emit(GoalEvent::GoalUpdated {
            goal_id: id,
            timestamp: now,
        });

        self.auto_activate_goals_by_priority(max_active_goals);
        self.snapshot(id)
    }

    /// Remove a goal, release goals waiting on it, and backfill capacity.
    pub fn delete_goal(&mut self, id: GoalId, max_active_goals: i64) -> Result<Goal, GoalError> {
        let idx = self.index_of(id)?;
        let now = Utc::now();

        let removed = self.goals.remove(idx);
        self.cache.forget(id);
        tracing::info!(goal_id = %id, title = %removed.title, "deleted goal");
        self.emit(GoalEvent::GoalDeleted {
            goal_id: id,
            title: removed.title.clone(),
            timestamp: now,
        });
        self.release_dependents(id, now);

        self.auto_activate_goals_by_priority(max_active_goals);
        Ok(removed)
    }

    /// Move a goal to `Inactive`, `Completed`, or `NotCompleted`.
    ///
    /// `recur_at` re-arms a recurring goal instead of leaving it terminal:
    /// the outcome is counted, the deadline moves to `recur_at`, and the goal
    /// is paused until then. Goals paused on this one are released whenever
    /// the target is terminal.
    pub fn set_goal_status(
        &mut self,
        id: GoalId,
        status: GoalStatus,
        recur_at: Option<DateTime<Utc>>,
        max_active_goals: i64,
    ) -> Result<Goal, GoalError> {
        let idx = self.index_of(id)?;
        let from = self.goals[idx].status;

        match status {
            GoalStatus::Active => {
                return Err(GoalError::Validation(
                    "goals become active through auto-activation or force activation".to_string(),
                ))
            }
            GoalStatus::Paused => {
                return Err(GoalError::Validation(
                    "pausing requires a pause condition".to_string(),
                ))
            }
            _ => {}
        }
        if !from.can_transition_to(status) {
            return Err(GoalError::InvalidTransition {
                goal_id: id,
                from: from.to_string(),
                to: status.to_string(),
            });
        }
        if recur_at.is_some() && !(status.is_terminal() && self.goals[idx].is_recurring()) {
            return Err(GoalError::Validation(
                "a recurrence date only applies when resolving a recurring goal".to_string(),
            ));
        }

        let now = Utc::now();
        let goal = &mut self.goals[idx];
        goal.force_activated = false;
        goal.pause = None;
        goal.touch(now);

        let mut events = Vec::new();
        match recur_at {
            Some(next) => {
                goal.recur_count += 1;
                if status == GoalStatus::Completed {
                    goal.completion_count += 1;
                } else {
                    goal.not_completed_count += 1;
                }
                goal.deadline = Some(next);
                goal.status = GoalStatus::Paused;
                goal.pause = Some(PauseCondition::Until(next));
                tracing::info!(goal_id = %id, outcome = %status, next = %next, "recurring goal re-armed");
                events.push(GoalEvent::GoalRecurred {
                    goal_id: id,
                    outcome: status,
                    recur_count: goal.recur_count,
                    next_occurrence: next,
                    timestamp: now,
                });
                events.push(GoalEvent::status_changed(id, from, GoalStatus::Paused));
            }
            None => {
                goal.status = status;
                tracing::info!(goal_id = %id, %from, to = %status, "goal status changed");
                events.push(GoalEvent::status_changed(id, from, status));
            }
        }
        self.cache.invalidate(id);
        for event in events {
            self.emit(event);
        }

        if status.is_terminal() {
            self.release_dependents(id, now);
        }

        // A goal stepped back from active sits out the refill it triggers.
        let held = (from == GoalStatus::Active && status == GoalStatus::Inactive).then_some(id);
        self.fill_active_slots(max_active_goals, held);
        self.snapshot(id)
    }

    /// Withhold a goal from auto-activation until `condition` resolves.
    pub fn pause_goal(
        &mut self,
        id: GoalId,
        condition: PauseCondition,
        max_active_goals: i64,
    ) -> Result<Goal, GoalError> {
        let idx = self.index_of(id)?;
        let from = self.goals[idx].status;
        if !from.can_transition_to(GoalStatus::Paused) {
            return Err(GoalError::InvalidTransition {
                goal_id: id,
                from: from.to_string(),
                to: GoalStatus::Paused.to_string(),
            });
        }
        if let PauseCondition::UntilGoal(target) = condition {
            self.check_pause_target(id, target)?;
        }

        let now = Utc::now();
        let goal = &mut self.goals[idx];
        goal.status = GoalStatus::Paused;
        goal.pause = Some(condition);
        goal.force_activated = false;
        goal.touch(now);
        tracing::info!(goal_id = %id, %condition, "paused goal");
        self.emit(GoalEvent::status_changed(id, from, GoalStatus::Paused));

        self.auto_activate_goals_by_priority(max_active_goals);
        self.snapshot(id)
    }

    /// Clear a goal's pause condition and return it to `Inactive`.
    pub fn unpause_goal(&mut self, id: GoalId, max_active_goals: i64) -> Result<Goal, GoalError> {
        let idx = self.index_of(id)?;
        let from = self.goals[idx].status;
        if from != GoalStatus::Paused {
            return Err(GoalError::InvalidTransition {
                goal_id: id,
                from: from.to_string(),
                to: GoalStatus::Inactive.to_string(),
            });
        }

        let now = Utc::now();
        let goal = &mut self.goals[idx];
        goal.status = GoalStatus::Inactive;
        goal.pause = None;
        goal.touch(now);
        tracing::info!(goal_id = %id, "unpaused goal");
        self.emit(GoalEvent::status_changed(id, from, GoalStatus::Inactive));

        self.auto_activate_goals_by_priority(max_active_goals);
        self.snapshot(id)
    }

    /// Activate a goal regardless of the cap.
    ///
    /// The override persists: auto-activation never demotes it.
    pub fn force_activate_goal(&mut self, id: GoalId, max_active_goals: i64) -> Result<Goal, GoalError> {
        let idx = self.index_of(id)?;
        let from = self.goals[idx].status;
        if !from.can_transition_to(GoalStatus::Active) {
            return Err(GoalError::InvalidTransition {
                goal_id: id,
                from: from.to_string(),
                to: GoalStatus::Active.to_string(),
            });
        }

        let now = Utc::now();
        let goal = &mut self.goals[idx];
        goal.status = GoalStatus::Active;
        goal.pause = None;
        goal.force_activated = true;
        goal.touch(now);
        tracing::info!(goal_id = %id, "force-activated goal");
        self.emit(GoalEvent::status_changed(id, from, GoalStatus::Active));

        self.auto_activate_goals_by_priority(max_active_goals);
        self.snapshot(id)
    }

    /// Promote the highest-priority eligible goals until `max_active_goals`
    /// are active. Returns the ids promoted, in promotion order.
    ///
    /// Date pauses that have expired are released first. Active goals are
    /// never demoted. Equal priorities are broken by creation order, so a
    /// second call without intervening mutations changes nothing.
    pub fn auto_activate_goals_by_priority(&mut self, max_active_goals: i64) -> Vec<GoalId> {
        self.fill_active_slots(max_active_goals, None)
    }

    fn fill_active_slots(&mut self, max_active_goals: i64, held: Option<GoalId>) -> Vec<GoalId> {
        let now = Utc::now();
        self.release_expired_pauses(now);

        if max_active_goals <= 0 {
            return Vec::new();
        }
        let cap = usize::try_from(max_active_goals).unwrap_or(usize::MAX);
        let slots = cap.saturating_sub(self.active_count());
        if slots == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<(usize, f64, u64)> = self
            .goals
            .iter()
            .enumerate()
            .filter(|(_, g)| g.status == GoalStatus::Inactive && Some(g.id) != held)
            .map(|(idx, g)| (idx, self.cache.priority_of(g, now), g.seq))
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.2.cmp(&b.2)));

        let mut activated = Vec::new();
        for (idx, priority, _) in candidates.into_iter().take(slots) {
            let goal = &mut self.goals[idx];
            goal.status = GoalStatus::Active;
            goal.touch(now);
            let id = goal.id;
            tracing::debug!(goal_id = %id, priority, "auto-activated goal");
            self.emit(GoalEvent::status_changed(id, GoalStatus::Inactive, GoalStatus::Active));
            activated.push(id);
        }
        if !activated.is_empty() {
            tracing::info!(count = activated.len(), cap, "auto-activation promoted goals");
        }
        activated
    }

    // ── Review ─────────────────────────────────────────────────

    /// Record a re-rating of a goal and move its review interval index.
    pub fn record_review(
        &mut self,
        id: GoalId,
        ratings: Ratings,
        intervals: &ReviewIntervals,
    ) -> Result<ReviewOutcome, GoalError> {
        ratings.validate()?;
        let idx = self.index_of(id)?;

        let now = Utc::now();
        let goal = &mut self.goals[idx];
        let ratings_match = goal.ratings == ratings;
        let current = intervals.clamp_index(goal.review_interval_index);
        goal.review_interval_index = next_interval_index(current, ratings_match, intervals);
        if !ratings_match {
            goal.ratings = ratings;
            self.cache.invalidate(id);
        }
        goal.last_reviewed_at = Some(now);
        goal.touch(now);

        let outcome = ReviewOutcome {
            goal: goal.clone(),
            ratings_match,
        };
        tracing::info!(
            goal_id = %id,
            ratings_match,
            review_interval_index = outcome.goal.review_interval_index,
            "recorded review"
        );
        self.emit(GoalEvent::ReviewRecorded {
            goal_id: id,
            ratings_match,
            review_interval_index: outcome.goal.review_interval_index,
            timestamp: now,
        });
        Ok(outcome)
    }

    /// Clamp every goal's review index into `intervals`. Returns how many
    /// goals changed.
    pub fn clamp_review_indices(&mut self, intervals: &ReviewIntervals) -> usize {
        let mut clamped = 0;
        for goal in self.goals.iter_mut() {
            let index = intervals.clamp_index(goal.review_interval_index);
            if index != goal.review_interval_index {
                goal.review_interval_index = index;
                clamped += 1;
            }
        }
        if clamped > 0 {
            tracing::debug!(clamped, "clamped review interval indices");
        }
        clamped
    }

    // ── Internals ──────────────────────────────────────────────

    fn index_of(&self, id: GoalId) -> Result<usize, GoalError> {
        self.goals
            .iter()
            .position(|g| g.id == id)
            .ok_or(GoalError::NotFound(id))
    }

    fn snapshot(&self, id: GoalId) -> Result<Goal, GoalError> {
        self.goal(id).cloned()
    }

    fn emit(&self, event: GoalEvent) {
        self.dispatcher.dispatch(&event);
    }

    /// A goal may wait on another existing, unresolved goal, as long as the
    /// chain of waits never leads back to itself.
    fn check_pause_target(&self, id: GoalId, target: GoalId) -> Result<(), GoalError> {
        if target == id {
            return Err(GoalError::InvariantViolation(format!(
                "goal {id} cannot be paused on itself"
            )));
        }
        let target_goal = self.goal(target)?;
        if target_goal.status.is_terminal() {
            return Err(GoalError::Validation(format!(
                "goal {target} is already {} and cannot be waited on",
                target_goal.status
            )));
        }

        let mut seen = HashSet::new();
        let mut cursor = Some(target);
        while let Some(current) = cursor {
            if current == id {
                return Err(GoalError::InvariantViolation(format!(
                    "pausing goal {id} on {target} would create a dependency cycle"
                )));
            }
            if !seen.insert(current) {
                break;
            }
            cursor = self.goal(current).ok().and_then(Goal::paused_on);
        }
        Ok(())
    }

    /// Release every goal paused on `resolved`. Returns the released ids.
    fn release_dependents(&mut self, resolved: GoalId, now: DateTime<Utc>) -> Vec<GoalId> {
        let mut released = Vec::new();
        for goal in self.goals.iter_mut() {
            if goal.paused_on() != Some(resolved) {
                continue;
            }
            goal.pause = None;
            if goal.status == GoalStatus::Paused {
                goal.status = GoalStatus::Inactive;
            }
            goal.touch(now);
            released.push(goal.id);
        }
        for id in &released {
            self.cache.invalidate(*id);
            tracing::info!(goal_id = %id, %resolved, "released goal waiting on resolved goal");
            self.emit(GoalEvent::status_changed(*id, GoalStatus::Paused, GoalStatus::Inactive));
        }
        released
    }

    /// Release goals whose date pause has passed.
    fn release_expired_pauses(&mut self, now: DateTime<Utc>) -> Vec<GoalId> {
        let mut released = Vec::new();
        for goal in self.goals.iter_mut() {
            let expired = matches!(goal.pause, Some(PauseCondition::Until(at)) if at <= now);
            if !expired || goal.status != GoalStatus::Paused {
                continue;
            }
            goal.pause = None;
            goal.status = GoalStatus::Inactive;
            goal.touch(now);
            released.push(goal.id);
        }
        for id in &released {
            self.cache.invalidate(*id);
            tracing::debug!(goal_id = %id, "pause date passed");
            self.emit(GoalEvent::status_changed(*id, GoalStatus::Paused, GoalStatus::Inactive));
        }
        released
    }
}
