use clap::Args;
use habitflow_core::Config;

use super::{open_tracker, print_json, resolve_as_of};

#[derive(Args)]
pub struct StatsArgs {
    /// Owner whose habits to summarize (defaults to the configured owner)
    #[arg(long)]
    owner: Option<String>,
    /// Day to evaluate streaks at (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    as_of: Option<String>,
}

pub fn run(args: StatsArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let as_of = resolve_as_of(args.as_of.as_deref(), config)?;
    let tracker = open_tracker(config)?;
    let owner = args.owner.as_deref().unwrap_or(&config.owner);

    let dashboard = tracker.dashboard(owner, as_of)?;
    print_json(&dashboard)
}
