//! Habit list commands.
//!
//! Every run signs the coordinator in, loads the list, applies one action,
//! waits for the remote writes it issued and prints the resulting state.
//! With `--offline` the habits are kept in the local data directory instead
//! of the remote store.

use clap::Subcommand;
use momentum_core::remote::FirestoreHabitStore;
use momentum_core::{
    spawn_coordinator, Config, HabitCoordinator, HabitSnapshot, LocalHabitStore, PlannerData,
    RemoteHabitStore, SessionSignal, SystemClock, UserScope,
};
use std::sync::Arc;

use super::{open_storage, to_indices, CliResult};
use crate::session;

/// Collection the offline store keeps habits under.
const OFFLINE_USER: &str = "offline";

#[derive(Subcommand)]
pub enum HabitAction {
    /// Show today's habits
    List,
    /// Add a habit
    Add {
        /// Habit name
        name: String,
    },
    /// Mark a habit done or not done
    Toggle {
        /// Position as shown by `habit list`
        position: usize,
    },
    /// Delete habits
    Delete {
        /// Positions as shown by `habit list`
        #[arg(required = true)]
        positions: Vec<usize>,
    },
}

pub fn run(action: HabitAction, offline: bool, json: bool) -> CliResult {
    let config = Config::load()?;
    let storage = open_storage(&config)?;

    let (store, scope) = if offline {
        let store: Arc<dyn RemoteHabitStore> = Arc::new(LocalHabitStore::new(storage.clone()));
        (store, UserScope::new(OFFLINE_USER))
    } else {
        let scope = session::current(&*storage)?
            .ok_or("not signed in (run `momentum auth login` or pass --offline)")?;
        let store: Arc<dyn RemoteHabitStore> = Arc::new(FirestoreHabitStore::from_config(&config.remote));
        (store, scope)
    };

    let planner = Arc::new(PlannerData::load(storage.clone()));
    let coordinator = HabitCoordinator::new(store, planner, storage, Arc::new(SystemClock));

    let runtime = tokio::runtime::Runtime::new()?;
    let snapshot = runtime.block_on(async move {
        let (handle, task) = spawn_coordinator(coordinator);
        handle.session(SessionSignal::SignedIn(scope))?;
        handle.activate()?;
        handle.settle().await?;

        let current = handle.snapshot();
        match action {
            HabitAction::List => {}
            HabitAction::Add { name } => handle.add(name)?,
            HabitAction::Toggle { position } => {
                let index = to_indices(&[position])?[0];
                let habit = current
                    .habits
                    .get(index)
                    .ok_or_else(|| format!("no habit at position {position}"))?;
                handle.toggle(habit.id)?;
            }
            HabitAction::Delete { positions } => handle.delete(to_indices(&positions)?)?,
        }
        handle.settle().await?;

        let snapshot = handle.snapshot();
        handle.shutdown()?;
        task.await?;
        Ok::<_, Box<dyn std::error::Error>>(snapshot)
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    if let Some(err) = &snapshot.last_error {
        eprintln!("warning: {err}");
    }
    Ok(())
}

fn print_snapshot(snapshot: &HabitSnapshot) {
    if snapshot.habits.is_empty() {
        println!("No habits yet.");
    }
    for (i, habit) in snapshot.habits.iter().enumerate() {
        let mark = if habit.is_completed { "x" } else { " " };
        println!("{:>3}. [{mark}] {}", i + 1, habit.name);
    }
    println!(
        "Done {}/{} ({:.0}%), streak {}/7",
        snapshot.completed_count,
        snapshot.habits.len(),
        snapshot.progress * 100.0,
        snapshot.streak_count
    );
}
