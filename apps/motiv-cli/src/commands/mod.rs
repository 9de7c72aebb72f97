// mod.rs — Shared plumbing for subcommands.
//
// Every invocation follows the same cycle: read settings, load the goal set,
// apply one operation through GoalManager, write the full set back.

pub mod goal;
pub mod review;

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use motiv_goal::{
    EventDispatcher, GoalFileStore, GoalId, GoalManager, LogSink, MotivPaths, ReviewIntervals,
    Settings,
};

/// One load → operate → save cycle.
pub struct Session {
    pub settings: Settings,
    pub intervals: ReviewIntervals,
    pub manager: GoalManager,
    store: GoalFileStore,
}

impl Session {
    pub fn open(paths: &MotivPaths) -> anyhow::Result<Self> {
        let settings = Settings::load_or_default(&paths.settings_file)
            .with_context(|| format!("reading {}", paths.settings_file.display()))?;
        let intervals = settings.intervals()?;
        let store = GoalFileStore::new(&paths.goals_dir)?;

        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_sink(Box::new(LogSink::new(&paths.events_log)));

        let goals = store
            .load_all()
            .with_context(|| format!("loading goals from {}", paths.goals_dir.display()))?;
        let mut manager = GoalManager::from_goals(goals)?.with_dispatcher(dispatcher);
        manager.clamp_review_indices(&intervals);

        Ok(Self {
            settings,
            intervals,
            manager,
            store,
        })
    }

    pub fn max_active(&self) -> i64 {
        self.settings.max_active_goals
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.store.save_all(self.manager.goals())?;
        Ok(())
    }

    /// Resolve a full id or an unambiguous prefix of one.
    pub fn resolve_id(&self, input: &str) -> anyhow::Result<GoalId> {
        if let Ok(id) = input.parse::<GoalId>() {
            return Ok(id);
        }
        if input.len() < 4 {
            bail!("goal id prefix '{}' is too short (need at least 4 characters)", input);
        }
        let matches: Vec<GoalId> = self
            .manager
            .goals()
            .iter()
            .map(|g| g.id)
            .filter(|id| id.to_string().starts_with(input))
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => bail!("no goal matches '{}'", input),
            _ => bail!("'{}' matches {} goals; use more characters", input, matches.len()),
        }
    }
}

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
pub fn parse_when(input: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}': expected YYYY-MM-DD or RFC 3339", input))?;
    match date.and_hms_opt(0, 0, 0) {
        Some(midnight) => Ok(midnight.and_utc()),
        None => bail!("invalid date '{}'", input),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

fn short_id(id: GoalId) -> String {
    id.to_string()[..8].to_string()
}
