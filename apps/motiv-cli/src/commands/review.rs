// review.rs — Review subcommands: record, due.

use chrono::Utc;
use clap::Subcommand;
use motiv_goal::{review_due_at, MotivPaths, Ratings, ReviewOutcome};

use super::{short_id, truncate, Session};

#[derive(Subcommand)]
pub enum ReviewCommands {
    /// Re-rate a goal. Unchanged ratings lengthen the review interval;
    /// changed ratings reset it.
    Record {
        /// Goal ID or unambiguous prefix.
        id: String,
        #[arg(short, long)]
        motivation: u8,
        #[arg(short, long)]
        urgency: u8,
    },
    /// List goals due for re-rating.
    Due,
}

pub fn execute(cmd: &ReviewCommands, paths: &MotivPaths) -> anyhow::Result<()> {
    let mut session = Session::open(paths)?;

    match cmd {
        ReviewCommands::Record {
            id,
            motivation,
            urgency,
        } => {
            let id = session.resolve_id(id)?;
            let outcome = record_review(&mut session, id, Ratings::new(*motivation, *urgency)?)?;
            let days = session.intervals.days_at(outcome.goal.review_interval_index);
            if outcome.ratings_match {
                println!("Ratings unchanged; next review in {} day(s).", days);
            } else {
                println!("Ratings updated; review cadence reset to {} day(s).", days);
            }
            session.save()
        }
        ReviewCommands::Due => list_due(&session),
    }
}

fn record_review(
    session: &mut Session,
    id: motiv_goal::GoalId,
    ratings: Ratings,
) -> anyhow::Result<ReviewOutcome> {
    Ok(session
        .manager
        .record_review(id, ratings, &session.intervals)?)
}

fn list_due(session: &Session) -> anyhow::Result<()> {
    let due = session
        .manager
        .goals_due_for_review(&session.intervals, Utc::now());

    if due.is_empty() {
        println!("No goals due for review.");
        return Ok(());
    }

    println!("{:<10} {:<30} {:<12} {:<6}", "ID", "TITLE", "DUE", "M/U");
    println!("{}", "-".repeat(62));
    for g in &due {
        println!(
            "{:<10} {:<30} {:<12} {}/{}",
            short_id(g.id),
            truncate(&g.title, 28),
            review_due_at(g, &session.intervals).format("%Y-%m-%d"),
            g.ratings.motivation,
            g.ratings.urgency,
        );
    }
    println!("\n{} goal(s) due.", due.len());
    Ok(())
}
