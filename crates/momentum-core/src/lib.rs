//! # Momentum Core Library
//!
//! Core logic for Momentum, a daily habit tracker. Habits live in a
//! per-user remote document store; the local machine keeps the weekly
//! streak map and the weekly planner in a small key-value store. The
//! `momentum` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Engine**: [`HabitCoordinator`] owns the habit list and applies
//!   optimistic mutations, remote completions and session changes one at a
//!   time. It can be driven directly or spawned as a task behind a
//!   [`CoordinatorHandle`].
//! - **Remote**: the [`RemoteHabitStore`] trait with a Firestore REST
//!   adapter, a local key-value backed store for offline use and an
//!   in-memory store
//! - **Planner**: weekday to task-list map merged into today's habits
//! - **Storage**: JSON key-value persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`HabitCoordinator`]: state owner and sync reconciler
//! - [`StreakTracker`]: weekly completion map
//! - [`PlannerData`]: weekly planner
//! - [`Config`]: application configuration

pub mod clock;
pub mod engine;
pub mod error;
pub mod habit;
pub mod logging;
pub mod planner;
pub mod remote;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{
    spawn_coordinator, Command, CoordinatorHandle, HabitCoordinator, HabitSnapshot, HabitState,
    OperationError, OperationKind, SessionSignal, StreakMap, StreakTracker, WeekdayToken,
};
pub use error::{ConfigError, CoreError, StorageError, StoreError};
pub use habit::{Habit, HabitId, SyncState};
pub use planner::{PlannerData, PlannerStore};
pub use remote::{
    FirestoreHabitStore, LocalHabitStore, MemoryHabitStore, RemoteHabitStore, UserScope,
};
pub use storage::{Config, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
