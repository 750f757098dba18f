use clap::Subcommand;
use momentum_core::clock::{full_weekday_name, parse_weekday};
use momentum_core::{Config, PlannerData, PlannerStore};

use super::{open_storage, to_indices, CliResult};

#[derive(Subcommand)]
pub enum PlannerAction {
    /// List planned tasks
    List {
        /// Only this day (e.g. "monday", "mon")
        day: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Plan a task for a day
    Add {
        /// Day of the week
        day: String,
        /// Task name
        task: String,
    },
    /// Remove a planned task
    Remove {
        /// Day of the week
        day: String,
        /// Position as shown by `planner list`
        index: usize,
    },
}

const WEEK: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

fn day_name(input: &str) -> Result<&'static str, Box<dyn std::error::Error>> {
    parse_weekday(input)
        .map(full_weekday_name)
        .ok_or_else(|| format!("unknown day: {input}").into())
}

pub fn run(action: PlannerAction) -> CliResult {
    let config = Config::load()?;
    let planner = PlannerData::load(open_storage(&config)?);

    match action {
        PlannerAction::List { day, json } => {
            let days: Vec<&str> = match day.as_deref() {
                Some(d) => vec![day_name(d)?],
                None => WEEK.to_vec(),
            };
            if json {
                let map: serde_json::Map<String, serde_json::Value> = days
                    .iter()
                    .map(|d| (d.to_string(), serde_json::json!(planner.tasks_for_day(d))))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
                return Ok(());
            }
            for d in days {
                let tasks = planner.tasks_for_day(d);
                println!("{d}:");
                if tasks.is_empty() {
                    println!("  (nothing planned)");
                }
                for (i, task) in tasks.iter().enumerate() {
                    println!("  {}. {task}", i + 1);
                }
            }
        }
        PlannerAction::Add { day, task } => {
            let day = day_name(&day)?;
            let task = task.trim();
            if task.is_empty() {
                return Err("task must not be empty".into());
            }
            planner.add_task(day, task)?;
            println!("Planned '{task}' for {day}");
        }
        PlannerAction::Remove { day, index } => {
            let day = day_name(&day)?;
            let index = to_indices(&[index])?[0];
            match planner.delete_task(day, index)? {
                Some(task) => println!("Removed '{task}' from {day}"),
                None => return Err(format!("no task at position {} on {day}", index + 1).into()),
            }
        }
    }
    Ok(())
}
