// goal.rs — Goal subcommands: add, list, show, edit, delete, and the
// status transitions (done, fail, reactivate, pause, unpause, force, activate).

use anyhow::bail;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use motiv_goal::{
    Goal, GoalPatch, GoalStatus, MotivPaths, NewGoal, PauseCondition, Ratings, RecurUnit,
    RecurrenceRule,
};

use super::{parse_when, short_id, truncate, Session};

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a new goal.
    Add {
        /// Goal title (e.g., "Run a half marathon").
        title: String,
        /// How much you want this (1-5).
        #[arg(short, long)]
        motivation: u8,
        /// How pressing it is (1-5).
        #[arg(short, long)]
        urgency: u8,
        /// Deadline (YYYY-MM-DD or RFC 3339).
        #[arg(long)]
        deadline: Option<String>,
        /// Longer description.
        #[arg(long)]
        description: Option<String>,
        /// Make the goal recurring every N units.
        #[arg(long)]
        every: Option<u32>,
        /// Recurrence unit: days, weeks, or months.
        #[arg(long, default_value = "days")]
        unit: String,
    },
    /// List goals, highest priority first.
    List {
        /// Filter by status (e.g., "active", "paused", "not_completed").
        #[arg(long)]
        status: Option<String>,
    },
    /// Show details for a goal.
    Show {
        /// Goal ID or unambiguous prefix.
        id: String,
    },
    /// Change a goal's title, ratings, deadline, or recurrence.
    Edit {
        /// Goal ID or unambiguous prefix.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long)]
        motivation: Option<u8>,
        #[arg(short, long)]
        urgency: Option<u8>,
        /// New deadline (YYYY-MM-DD or RFC 3339).
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<String>,
        /// Remove the deadline.
        #[arg(long)]
        clear_deadline: bool,
        /// Recur every N units.
        #[arg(long, conflicts_with = "no_recur")]
        every: Option<u32>,
        /// Recurrence unit: days, weeks, or months.
        #[arg(long, default_value = "days")]
        unit: String,
        /// Stop the goal from recurring.
        #[arg(long)]
        no_recur: bool,
    },
    /// Delete a goal.
    Delete {
        /// Goal ID or unambiguous prefix.
        id: String,
    },
    /// Mark a goal completed.
    Done {
        /// Goal ID or unambiguous prefix.
        id: String,
        /// When a recurring goal comes back (defaults to its next occurrence).
        #[arg(long)]
        recur_at: Option<String>,
        /// Resolve a recurring goal for good instead of re-arming it.
        #[arg(long, conflicts_with = "recur_at")]
        last: bool,
    },
    /// Mark a goal not completed.
    Fail {
        /// Goal ID or unambiguous prefix.
        id: String,
        /// When a recurring goal comes back (defaults to its next occurrence).
        #[arg(long)]
        recur_at: Option<String>,
        /// Resolve a recurring goal for good instead of re-arming it.
        #[arg(long, conflicts_with = "recur_at")]
        last: bool,
    },
    /// Return a goal to inactive (reopen a finished goal or step back from an active one).
    Reactivate {
        /// Goal ID or unambiguous prefix.
        id: String,
    },
    /// Pause a goal until a date or until another goal is resolved.
    Pause {
        /// Goal ID or unambiguous prefix.
        id: String,
        /// Resume date (YYYY-MM-DD or RFC 3339).
        #[arg(long, conflicts_with = "until_goal", required_unless_present = "until_goal")]
        until: Option<String>,
        /// Wait until this goal is completed, not completed, or deleted.
        #[arg(long)]
        until_goal: Option<String>,
    },
    /// Clear a goal's pause.
    Unpause {
        /// Goal ID or unambiguous prefix.
        id: String,
    },
    /// Activate a goal even if the active-goal cap is reached.
    Force {
        /// Goal ID or unambiguous prefix.
        id: String,
    },
    /// Fill free active slots with the highest-priority goals.
    Activate,
}

pub fn execute(cmd: &GoalCommands, paths: &MotivPaths) -> anyhow::Result<()> {
    let mut session = Session::open(paths)?;

    match cmd {
        GoalCommands::Add {
            title,
            motivation,
            urgency,
            deadline,
            description,
            every,
            unit,
        } => {
            let recurrence = recurrence_from_args(*every, unit)?;
            let deadline = deadline.as_deref().map(parse_when).transpose()?;
            let goal = add_goal(
                &mut session,
                title,
                Ratings::new(*motivation, *urgency)?,
                deadline,
                description.clone(),
                recurrence,
            )?;
            println!("Goal created: {}", goal.id);
            println!("  Title:  {}", goal.title);
            println!("  Status: {}", goal.status);
        }
        GoalCommands::List { status } => {
            let filter = status.as_deref().map(str::parse::<GoalStatus>).transpose()?;
            return list_goals(&session, filter);
        }
        GoalCommands::Show { id } => {
            let id = session.resolve_id(id)?;
            return show_goal(&session, session.manager.goal(id)?);
        }
        GoalCommands::Edit {
            id,
            title,
            description,
            motivation,
            urgency,
            deadline,
            clear_deadline,
            every,
            unit,
            no_recur,
        } => {
            let id = session.resolve_id(id)?;
            let patch = GoalPatch {
                title: title.clone(),
                description: description.clone().map(Some),
                motivation: *motivation,
                urgency: *urgency,
                deadline: if *clear_deadline {
                    Some(None)
                } else {
                    deadline.as_deref().map(parse_when).transpose()?.map(Some)
                },
                recurrence: if *no_recur {
                    Some(None)
                } else {
                    recurrence_from_args(*every, unit)?.map(Some)
                },
            };
            if patch.is_empty() {
                bail!("nothing to change: pass at least one field to edit");
            }
            let max = session.max_active();
            let goal = session.manager.update_goal(id, &patch, max)?;
            println!("Goal updated: {} ({})", goal.title, goal.status);
        }
        GoalCommands::Delete { id } => {
            let id = session.resolve_id(id)?;
            let max = session.max_active();
            let removed = session.manager.delete_goal(id, max)?;
            println!("Deleted goal: {} ({})", removed.title, removed.id);
        }
        GoalCommands::Done { id, recur_at, last } => {
            let id = session.resolve_id(id)?;
            let goal = resolve_goal(&mut session, id, GoalStatus::Completed, recur_at.as_deref(), *last)?;
            report_resolution(&goal);
        }
        GoalCommands::Fail { id, recur_at, last } => {
            let id = session.resolve_id(id)?;
            let goal = resolve_goal(&mut session, id, GoalStatus::NotCompleted, recur_at.as_deref(), *last)?;
            report_resolution(&goal);
        }
        GoalCommands::Reactivate { id } => {
            let id = session.resolve_id(id)?;
            let max = session.max_active();
            let goal = session
                .manager
                .set_goal_status(id, GoalStatus::Inactive, None, max)?;
            println!("Goal {} is now {}.", goal.title, goal.status);
        }
        GoalCommands::Pause {
            id,
            until,
            until_goal,
        } => {
            let id = session.resolve_id(id)?;
            let condition = match (until, until_goal) {
                (Some(date), _) => PauseCondition::Until(parse_when(date)?),
                (None, Some(other)) => PauseCondition::UntilGoal(session.resolve_id(other)?),
                (None, None) => bail!("pass --until or --until-goal"),
            };
            let max = session.max_active();
            let goal = session.manager.pause_goal(id, condition, max)?;
            println!("Paused {} {}.", goal.title, condition);
        }
        GoalCommands::Unpause { id } => {
            let id = session.resolve_id(id)?;
            let max = session.max_active();
            let goal = session.manager.unpause_goal(id, max)?;
            println!("Goal {} is now {}.", goal.title, goal.status);
        }
        GoalCommands::Force { id } => {
            let id = session.resolve_id(id)?;
            let max = session.max_active();
            let goal = session.manager.force_activate_goal(id, max)?;
            println!(
                "Goal {} force-activated ({} active, cap {}).",
                goal.title,
                session.manager.active_count(),
                max
            );
        }
        GoalCommands::Activate => {
            let max = session.max_active();
            let activated = session.manager.auto_activate_goals_by_priority(max);
            if activated.is_empty() {
                println!("No goals activated ({} active, cap {}).", session.manager.active_count(), max);
            }
            for id in activated {
                let goal = session.manager.goal(id)?;
                println!("Activated: {} ({})", goal.title, short_id(goal.id));
            }
        }
    }

    session.save()
}

fn recurrence_from_args(every: Option<u32>, unit: &str) -> anyhow::Result<Option<RecurrenceRule>> {
    every
        .map(|period| -> anyhow::Result<RecurrenceRule> {
            let unit: RecurUnit = unit.parse()?;
            Ok(RecurrenceRule::new(period, unit)?)
        })
        .transpose()
}

fn add_goal(
    session: &mut Session,
    title: &str,
    ratings: Ratings,
    deadline: Option<DateTime<Utc>>,
    description: Option<String>,
    recurrence: Option<RecurrenceRule>,
) -> anyhow::Result<Goal> {
    let mut request = NewGoal::new(title, ratings);
    request.deadline = deadline;
    request.description = description;
    request.recurrence = recurrence;
    let max = session.max_active();
    Ok(session.manager.create_goal(request, max)?)
}

/// Complete or fail a goal. Recurring goals are re-armed for `recur_at`, or
/// for their rule's next occurrence, unless `last` is set.
fn resolve_goal(
    session: &mut Session,
    id: motiv_goal::GoalId,
    outcome: GoalStatus,
    recur_at: Option<&str>,
    last: bool,
) -> anyhow::Result<Goal> {
    let goal = session.manager.goal(id)?;
    let next = match (goal.recurrence, recur_at, last) {
        (_, _, true) => None,
        (Some(_), Some(date), false) => Some(parse_when(date)?),
        (Some(rule), None, false) => rule.next_after(Utc::now()),
        (None, Some(_), false) => bail!("'{}' is not a recurring goal", goal.title),
        (None, None, false) => None,
    };
    let max = session.max_active();
    Ok(session.manager.set_goal_status(id, outcome, next, max)?)
}

fn report_resolution(goal: &Goal) {
    match goal.pause {
        Some(PauseCondition::Until(next)) if goal.is_recurring() => {
            println!(
                "Goal {} resolved; next occurrence {} (recurred {} time(s)).",
                goal.title,
                next.format("%Y-%m-%d"),
                goal.recur_count
            );
        }
        _ => println!("Goal {} is now {}.", goal.title, goal.status),
    }
}

fn list_goals(session: &Session, status: Option<GoalStatus>) -> anyhow::Result<()> {
    let ranked: Vec<_> = session
        .manager
        .goals_by_priority()
        .into_iter()
        .filter(|(g, _)| status.map_or(true, |s| g.status == s))
        .collect();

    if ranked.is_empty() {
        println!("No goals found.");
        return Ok(());
    }

    println!(
        "{:<10} {:<30} {:<14} {:>8} {:<12}",
        "ID", "TITLE", "STATUS", "PRIORITY", "DEADLINE"
    );
    println!("{}", "-".repeat(78));

    for (g, priority) in &ranked {
        let deadline = g
            .deadline
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let marker = if g.force_activated { "*" } else { "" };
        println!(
            "{:<10} {:<30} {:<14} {:>8.2} {:<12}",
            short_id(g.id),
            truncate(&g.title, 28),
            format!("{}{}", g.status, marker),
            priority,
            deadline,
        );
    }
    println!(
        "\n{} goal(s), {} active (cap {}).",
        ranked.len(),
        session.manager.active_count(),
        session.max_active()
    );

    Ok(())
}

fn show_goal(session: &Session, g: &Goal) -> anyhow::Result<()> {
    println!("Goal:       {}", g.id);
    println!("Title:      {}", g.title);
    if let Some(ref description) = g.description {
        println!("About:      {}", description);
    }
    println!("Status:     {}{}", g.status, if g.force_activated { " (forced)" } else { "" });
    println!(
        "Ratings:    motivation {}, urgency {}",
        g.ratings.motivation, g.ratings.urgency
    );
    println!("Priority:   {:.2}", session.manager.priority(g.id));
    if let Some(deadline) = g.deadline {
        println!("Deadline:   {}", deadline.to_rfc3339());
    }
    if let Some(pause) = g.pause {
        println!("Paused:     {}", pause);
    }
    if let Some(rule) = g.recurrence {
        println!(
            "Recurs:     every {} {} ({} done, {} missed)",
            rule.period, rule.unit, g.completion_count, g.not_completed_count
        );
    }
    println!(
        "Review:     every {} day(s), next due {}",
        session.intervals.days_at(g.review_interval_index),
        motiv_goal::review_due_at(g, &session.intervals).format("%Y-%m-%d")
    );
    println!("Created:    {}", g.created_at.to_rfc3339());
    println!("Updated:    {}", g.last_updated.to_rfc3339());
    Ok(())
}
