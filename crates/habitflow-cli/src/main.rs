use clap::{Parser, Subcommand};
use habitflow_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "habitflow-cli", version, about = "HabitFlow CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management and completion tracking
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Dashboard summary for one owner
    Stats(commands::stats::StatsArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let loaded = Config::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&config);
    if let Err(e) = &loaded {
        tracing::warn!(error = %e, "using default configuration");
    }

    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action, &config),
        Commands::Stats(args) => commands::stats::run(args, &config),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
