pub mod config;
pub mod habit;
pub mod stats;

use habitflow_core::{CalendarDay, Config, HabitDb, HabitTracker};

/// Open the configured database behind a tracker.
pub fn open_tracker(config: &Config) -> Result<HabitTracker<HabitDb>, Box<dyn std::error::Error>> {
    let db = HabitDb::open_at(&config.database_path()?)?;
    Ok(HabitTracker::with_config(db, config))
}

/// `--as-of` if given, otherwise the configured today.
pub fn resolve_as_of(
    as_of: Option<&str>,
    config: &Config,
) -> Result<CalendarDay, Box<dyn std::error::Error>> {
    match as_of {
        Some(raw) => Ok(CalendarDay::parse(raw)?),
        None => Ok(config.today()),
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
