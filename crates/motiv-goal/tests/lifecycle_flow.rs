// lifecycle_flow.rs — End-to-end flow across manager, store, settings, events.
//
// Each step reloads the goal set from disk, applies one operation, and saves
// the full set back — the same cycle the CLI runs per invocation:
//
//   1. Settings: cap of 2, short review cadence
//   2. Create three goals; the two highest-priority become active
//   3. Pause the runner-up on the top goal; the third goal backfills
//   4. Complete the top goal; the paused goal is released and waits
//   5. Re-rate a goal twice (stable) and once (changed)
//   6. Complete a recurring goal; it comes back paused until its next date
//   7. Delete a goal; the event log holds the full history

use chrono::{Duration, Utc};
use tempfile::tempdir;

use motiv_goal::{
    EventDispatcher, GoalEvent, GoalFileStore, GoalId, GoalManager, GoalStatus, LogSink,
    MotivPaths, NewGoal, PauseCondition, Ratings, RecurUnit, RecurrenceRule, Settings,
};

struct Project {
    paths: MotivPaths,
    store: GoalFileStore,
}

impl Project {
    fn open(root: &std::path::Path) -> Self {
        let paths = MotivPaths::for_project(root);
        let store = GoalFileStore::new(&paths.goals_dir).unwrap();
        Self { paths, store }
    }

    fn settings(&self) -> Settings {
        Settings::load_or_default(&self.paths.settings_file).unwrap()
    }

    /// Load, run `op`, save.
    fn with_manager<T>(&self, op: impl FnOnce(&mut GoalManager, &Settings) -> T) -> T {
        let settings = self.settings();
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_sink(Box::new(LogSink::new(&self.paths.events_log)));
        let mut manager = GoalManager::from_goals(self.store.load_all().unwrap())
            .unwrap()
            .with_dispatcher(dispatcher);
        manager.clamp_review_indices(&settings.intervals().unwrap());

        let result = op(&mut manager, &settings);
        self.store.save_all(manager.goals()).unwrap();
        result
    }

    fn status(&self, id: GoalId) -> GoalStatus {
        self.store.get(id).unwrap().unwrap().status
    }
}

fn rated(title: &str, motivation: u8, urgency: u8) -> NewGoal {
    NewGoal::new(title, Ratings::new(motivation, urgency).unwrap())
}

#[test]
fn full_goal_lifecycle_through_persistence() {
    let root = tempdir().unwrap();
    let project = Project::open(root.path());

    Settings {
        max_active_goals: 2,
        review_intervals: vec![1, 3, 7],
    }
    .save(&project.paths.settings_file)
    .unwrap();

    // Step 2: create.
    let top = project.with_manager(|m, s| m.create_goal(rated("ship release", 5, 5), s.max_active_goals).unwrap());
    let runner_up =
        project.with_manager(|m, s| m.create_goal(rated("write docs", 4, 4), s.max_active_goals).unwrap());
    let third = project.with_manager(|m, s| m.create_goal(rated("tidy desk", 1, 2), s.max_active_goals).unwrap());

    assert_eq!(project.status(top.id), GoalStatus::Active);
    assert_eq!(project.status(runner_up.id), GoalStatus::Active);
    assert_eq!(project.status(third.id), GoalStatus::Inactive);

    // Step 3: pause runner-up on top; third backfills.
    project.with_manager(|m, s| {
        m.pause_goal(runner_up.id, PauseCondition::UntilGoal(top.id), s.max_active_goals)
            .unwrap()
    });
    assert_eq!(project.status(runner_up.id), GoalStatus::Paused);
    assert_eq!(project.status(third.id), GoalStatus::Active);

    // Step 4: completing top releases runner-up, which competes for the
    // freed slot.
    project.with_manager(|m, s| {
        m.set_goal_status(top.id, GoalStatus::Completed, None, s.max_active_goals)
            .unwrap()
    });
    assert_eq!(project.status(top.id), GoalStatus::Completed);
    assert_eq!(project.status(runner_up.id), GoalStatus::Active);
    assert!(project.store.get(runner_up.id).unwrap().unwrap().pause.is_none());

    // Step 5: reviews.
    let same = Ratings::new(1, 2).unwrap();
    let first = project.with_manager(|m, s| {
        m.record_review(third.id, same, &s.intervals().unwrap()).unwrap()
    });
    let second = project.with_manager(|m, s| {
        m.record_review(third.id, same, &s.intervals().unwrap()).unwrap()
    });
    assert!(first.ratings_match && second.ratings_match);
    assert!(second.goal.review_interval_index > first.goal.review_interval_index);

    let changed = project.with_manager(|m, s| {
        m.record_review(third.id, Ratings::new(3, 3).unwrap(), &s.intervals().unwrap())
            .unwrap()
    });
    assert!(!changed.ratings_match);
    assert_eq!(changed.goal.review_interval_index, 0);
    assert_eq!(
        project.store.get(third.id).unwrap().unwrap().ratings,
        Ratings::new(3, 3).unwrap()
    );

    // Step 6: recurring goal.
    let rule = RecurrenceRule::new(7, RecurUnit::Days).unwrap();
    let chore = project.with_manager(|m, _| m.create_goal(rated("water plants", 2, 3).with_recurrence(rule), 0).unwrap());
    let next = Utc::now() + Duration::weeks(2);
    let rearmed = project.with_manager(|m, s| {
        m.set_goal_status(chore.id, GoalStatus::Completed, Some(next), s.max_active_goals)
            .unwrap()
    });
    assert_eq!(rearmed.status, GoalStatus::Paused);
    assert_eq!(rearmed.pause, Some(PauseCondition::Until(next)));
    assert_eq!(rearmed.recur_count, 1);
    assert_eq!(rearmed.completion_count, 1);

    // Step 7: delete.
    project.with_manager(|m, s| m.delete_goal(third.id, s.max_active_goals).unwrap());
    assert!(project.store.get(third.id).unwrap().is_none());
    assert_eq!(project.store.load_all().unwrap().len(), 3);

    let log = std::fs::read_to_string(&project.paths.events_log).unwrap();
    let events: Vec<GoalEvent> = log
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(
        events.iter().filter(|e| e.event_type() == "goal_created").count(),
        4
    );
    assert!(events.iter().any(|e| e.event_type() == "goal_recurred"));
    assert!(events.iter().any(|e| e.event_type() == "review_recorded"));
    assert_eq!(events.last().unwrap().event_type(), "goal_deleted");
}

#[test]
fn shrinking_review_config_clamps_on_load() {
    let root = tempdir().unwrap();
    let project = Project::open(root.path());

    let goal = project.with_manager(|m, _| m.create_goal(rated("stretch", 2, 2), 0).unwrap());
    for _ in 0..5 {
        project.with_manager(|m, s| {
            m.record_review(goal.id, Ratings::new(2, 2).unwrap(), &s.intervals().unwrap())
                .unwrap()
        });
    }
    assert_eq!(
        project.store.get(goal.id).unwrap().unwrap().review_interval_index,
        5
    );

    Settings {
        max_active_goals: 3,
        review_intervals: vec![5, 10],
    }
    .save(&project.paths.settings_file)
    .unwrap();

    project.with_manager(|_, _| ());
    assert_eq!(
        project.store.get(goal.id).unwrap().unwrap().review_interval_index,
        1
    );
}
