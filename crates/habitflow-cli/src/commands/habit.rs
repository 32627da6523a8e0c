use clap::Subcommand;
use habitflow_core::{CalendarDay, Config, HabitCategory, HabitId, HabitPatch, NewHabit};

use super::{open_tracker, print_json, resolve_as_of};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Create {
        /// Habit title
        title: String,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
        /// Category (Health, Productivity, Learning, Fitness, Mindfulness, Other)
        #[arg(long)]
        category: Option<String>,
        /// Target number of days
        #[arg(long)]
        target_days: Option<u32>,
        /// Display color (#RRGGBB)
        #[arg(long)]
        color: Option<String>,
        /// Owner (defaults to the configured owner)
        #[arg(long)]
        owner: Option<String>,
    },
    /// List habits with their streaks
    List {
        #[arg(long)]
        owner: Option<String>,
        /// Evaluate streaks at this day (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Show one habit
    Show {
        id: String,
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Mark a habit done (today unless --date is given)
    Done {
        id: String,
        /// Day to mark (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Remove a completion
    Undo {
        id: String,
        /// Day to unmark (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Edit habit details
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        target_days: Option<u32>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Pause a habit
    Pause { id: String },
    /// Resume a paused habit
    Resume { id: String },
    /// Delete a habit and its history
    Delete { id: String },
}

fn parse_category(raw: Option<String>) -> Result<Option<HabitCategory>, Box<dyn std::error::Error>> {
    Ok(raw.map(|c| c.parse::<HabitCategory>()).transpose()?)
}

pub fn run(action: HabitAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        HabitAction::Create {
            title,
            description,
            category,
            target_days,
            color,
            owner,
        } => {
            let new = NewHabit {
                title,
                description,
                category: parse_category(category)?,
                target_days,
                color,
            };
            let tracker = open_tracker(config)?;
            let owner = owner.as_deref().unwrap_or(&config.owner);
            let view = tracker.create_habit(owner, new, config.today())?;
            print_json(&view)?;
        }
        HabitAction::List { owner, as_of } => {
            let as_of = resolve_as_of(as_of.as_deref(), config)?;
            let tracker = open_tracker(config)?;
            let owner = owner.as_deref().unwrap_or(&config.owner);
            print_json(&tracker.list(owner, as_of)?)?;
        }
        HabitAction::Show { id, as_of } => {
            let id: HabitId = id.parse()?;
            let as_of = resolve_as_of(as_of.as_deref(), config)?;
            let tracker = open_tracker(config)?;
            print_json(&tracker.view(id, as_of)?)?;
        }
        HabitAction::Done { id, date, as_of } => {
            let id: HabitId = id.parse()?;
            let as_of = resolve_as_of(as_of.as_deref(), config)?;
            let day = match date {
                Some(raw) => CalendarDay::parse(&raw)?,
                None => as_of,
            };
            let tracker = open_tracker(config)?;
            print_json(&tracker.mark_done(id, day, as_of)?)?;
        }
        HabitAction::Undo { id, date, as_of } => {
            let id: HabitId = id.parse()?;
            let day = CalendarDay::parse(&date)?;
            let as_of = resolve_as_of(as_of.as_deref(), config)?;
            let tracker = open_tracker(config)?;
            print_json(&tracker.unmark(id, day, as_of)?)?;
        }
        HabitAction::Edit {
            id,
            title,
            description,
            category,
            target_days,
            color,
        } => {
            let id: HabitId = id.parse()?;
            let patch = HabitPatch {
                title,
                description: description.map(Some),
                category: parse_category(category)?,
                target_days,
                color,
                is_active: None,
            };
            let tracker = open_tracker(config)?;
            print_json(&tracker.update_details(id, patch, config.today())?)?;
        }
        HabitAction::Pause { id } => {
            let id: HabitId = id.parse()?;
            let tracker = open_tracker(config)?;
            print_json(&tracker.set_active(id, false, config.today())?)?;
        }
        HabitAction::Resume { id } => {
            let id: HabitId = id.parse()?;
            let tracker = open_tracker(config)?;
            print_json(&tracker.set_active(id, true, config.today())?)?;
        }
        HabitAction::Delete { id } => {
            let id: HabitId = id.parse()?;
            let tracker = open_tracker(config)?;
            tracker.delete_habit(id)?;
            println!("Habit deleted: {id}");
        }
    }
    Ok(())
}
