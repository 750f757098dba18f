use clap::{Parser, Subcommand};
use momentum_core::Config;

mod commands;
mod session;

#[derive(Parser)]
#[command(name = "momentum", version, about = "Momentum habit tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Today's habits
    Habit {
        /// Use an in-memory store instead of the remote one
        #[arg(long, global = true)]
        offline: bool,
        /// Output as JSON
        #[arg(long, global = true)]
        json: bool,
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Weekly planner
    Planner {
        #[command(subcommand)]
        action: commands::planner::PlannerAction,
    },
    /// Weekly completion streak
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Session management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    momentum_core::logging::init(&Config::load_or_default().logging.level);

    let result = match cli.command {
        Commands::Habit {
            offline,
            json,
            action,
        } => commands::habit::run(action, offline, json),
        Commands::Planner { action } => commands::planner::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
