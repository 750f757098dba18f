use clap::Subcommand;
use momentum_core::{Config, StreakTracker, SystemClock, WeekdayToken};
use std::sync::Arc;

use super::{open_storage, CliResult};

#[derive(Subcommand)]
pub enum StreakAction {
    /// Show this week's completed days
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: StreakAction) -> CliResult {
    let config = Config::load()?;
    let tracker = StreakTracker::load(open_storage(&config)?, Arc::new(SystemClock));

    match action {
        StreakAction::Show { json } => {
            if json {
                let value = serde_json::json!({
                    "days": tracker.days(),
                    "count": tracker.count(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                let strip: Vec<String> = WeekdayToken::ALL
                    .iter()
                    .map(|day| {
                        let done = tracker.days().get(day).copied().unwrap_or(false);
                        if done {
                            format!("[{}]", day.initial())
                        } else {
                            format!(" {} ", day.initial())
                        }
                    })
                    .collect();
                println!("{}", strip.join(""));
                println!("{} of 7 days this week", tracker.count());
            }
        }
    }
    Ok(())
}
