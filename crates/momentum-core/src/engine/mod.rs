//! Habit coordinator: the single owner of in-memory habit state.
//!
//! All state (habit list, merge-window flag, streak map, last error) lives
//! in [`HabitCoordinator`] and is only touched through `&mut self`. Remote
//! calls are spawned as independent tokio tasks; their results come back as
//! completions over an mpsc channel and are applied by the coordinator, so
//! mutations never run concurrently with each other.
//!
//! Local state always wins. A failed remote write is recorded in
//! [`HabitState::last_error`] and on the habit's [`SyncState`], but the
//! optimistic change is never rolled back and nothing is retried. Two
//! overlapping saves of the same habit are not serialized; whichever the
//! store applies last is what it keeps.
//!
//! Every change publishes a [`HabitSnapshot`] on a watch channel.

pub mod actor;
mod mutation;
mod reconcile;
pub mod streak;

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::clock::Clock;
use crate::error::StoreError;
use crate::habit::{self, Habit, HabitId, SyncState};
use crate::planner::PlannerStore;
use crate::remote::{RemoteHabitStore, UserScope};
use crate::storage::KeyValueStore;

pub use actor::{spawn_coordinator, Command, CoordinatorHandle};
pub use streak::{StreakMap, StreakTracker, WeekdayToken, STREAK_STORAGE_KEY};

/// Which remote operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Load,
    Save,
    Delete,
}

/// The most recent failure of any remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationError {
    pub kind: OperationKind,
    pub habit_name: Option<String>,
    pub message: String,
    #[serde(skip)]
    pub error: StoreError,
}

impl OperationError {
    fn new(kind: OperationKind, habit_name: Option<String>, error: StoreError) -> Self {
        Self {
            kind,
            habit_name,
            message: error.to_string(),
            error,
        }
    }

    pub fn load(error: StoreError) -> Self {
        Self::new(OperationKind::Load, None, error)
    }

    pub fn save(habit_name: impl Into<String>, error: StoreError) -> Self {
        Self::new(OperationKind::Save, Some(habit_name.into()), error)
    }

    pub fn delete(habit_name: impl Into<String>, error: StoreError) -> Self {
        Self::new(OperationKind::Delete, Some(habit_name.into()), error)
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.habit_name.as_deref().unwrap_or_default();
        match self.kind {
            OperationKind::Load => write!(f, "Failed to load habits: {}", self.message),
            OperationKind::Save => write!(f, "Failed to save '{name}': {}", self.message),
            OperationKind::Delete => write!(f, "Failed to delete '{name}': {}", self.message),
        }
    }
}

/// Authentication signal from the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    SignedIn(UserScope),
    SignedOut,
}

/// Mutable state owned by the coordinator.
#[derive(Debug, Clone, Default)]
pub struct HabitState {
    /// Always partitioned: incomplete habits first.
    pub habits: Vec<Habit>,
    /// Planner tasks already merged this session.
    pub merged_planner: bool,
    pub last_error: Option<OperationError>,
    pub is_loading: bool,
    /// Text typed but not yet submitted as a habit.
    pub pending_input: String,
}

/// What subscribers see after every change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HabitSnapshot {
    pub habits: Vec<Habit>,
    pub last_error: Option<OperationError>,
    pub is_loading: bool,
    pub pending_input: String,
    pub streak: StreakMap,
    pub streak_count: usize,
    pub completed_count: usize,
    pub progress: f64,
}

#[derive(Debug)]
enum Completion {
    Loaded(Result<Vec<Habit>, StoreError>),
    Saved {
        id: HabitId,
        name: String,
        result: Result<String, StoreError>,
    },
    Deleted {
        name: String,
        result: Result<(), StoreError>,
    },
}

/// A completion tagged with the session epoch it was issued in.
#[derive(Debug)]
struct Envelope {
    epoch: u64,
    completion: Completion,
}

/// Owner of habit state; see the module docs.
///
/// Methods that issue remote calls spawn tokio tasks and must be called
/// from within a tokio runtime.
pub struct HabitCoordinator {
    state: HabitState,
    streak: StreakTracker,
    scope: Option<UserScope>,
    store: Arc<dyn RemoteHabitStore>,
    planner: Arc<dyn PlannerStore>,
    clock: Arc<dyn Clock>,
    epoch: u64,
    in_flight: usize,
    completions_tx: mpsc::UnboundedSender<Envelope>,
    completions_rx: mpsc::UnboundedReceiver<Envelope>,
    notifier: watch::Sender<HabitSnapshot>,
}

impl HabitCoordinator {
    pub fn new(
        store: Arc<dyn RemoteHabitStore>,
        planner: Arc<dyn PlannerStore>,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let streak = StreakTracker::load(storage, clock.clone());
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (notifier, _) = watch::channel(HabitSnapshot::default());
        let mut coordinator = Self {
            state: HabitState::default(),
            streak,
            scope: None,
            store,
            planner,
            clock,
            epoch: 0,
            in_flight: 0,
            completions_tx,
            completions_rx,
            notifier,
        };
        coordinator.publish();
        coordinator
    }

    /// Start with `scope` already signed in.
    pub fn with_scope(mut self, scope: UserScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn state(&self) -> &HabitState {
        &self.state
    }

    pub fn habits(&self) -> &[Habit] {
        &self.state.habits
    }

    pub fn last_error(&self) -> Option<&OperationError> {
        self.state.last_error.as_ref()
    }

    pub fn streak_count(&self) -> usize {
        self.streak.count()
    }

    pub fn streak(&self) -> &StreakMap {
        self.streak.days()
    }

    pub fn scope(&self) -> Option<&UserScope> {
        self.scope.as_ref()
    }

    /// Remote operations issued but not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn snapshot(&self) -> HabitSnapshot {
        HabitSnapshot {
            habits: self.state.habits.clone(),
            last_error: self.state.last_error.clone(),
            is_loading: self.state.is_loading,
            pending_input: self.state.pending_input.clone(),
            streak: self.streak.days().clone(),
            streak_count: self.streak.count(),
            completed_count: habit::completed_count(&self.state.habits),
            progress: habit::progress(&self.state.habits),
        }
    }

    /// Receive every future snapshot.
    pub fn subscribe(&self) -> watch::Receiver<HabitSnapshot> {
        self.notifier.subscribe()
    }

    /// React to the session layer signing a user in or out.
    pub fn handle_session(&mut self, signal: SessionSignal) {
        match signal {
            SessionSignal::SignedIn(scope) => {
                tracing::info!(user = %scope.user_id, "User signed in");
                self.scope = Some(scope);
            }
            SessionSignal::SignedOut => {
                tracing::info!("User signed out");
                self.scope = None;
                self.reset();
            }
        }
    }

    /// Clear the habit list, merge-window flag and last error.
    ///
    /// Completions of operations issued before the reset are discarded when
    /// they arrive.
    pub fn reset(&mut self) {
        self.state = HabitState::default();
        self.epoch += 1;
        self.publish();
    }

    /// Apply every outstanding completion, waiting for those still running.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            if !self.apply_next().await {
                break;
            }
        }
    }

    /// Wait for one completion and apply it. Returns false if none can arrive.
    pub async fn apply_next(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(envelope) => {
                self.apply(envelope);
                true
            }
            None => false,
        }
    }

    /// Apply whatever completions have already arrived, without waiting.
    pub fn apply_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(envelope) = self.completions_rx.try_recv() {
            self.apply(envelope);
            applied += 1;
        }
        applied
    }

    async fn recv_envelope(&mut self) -> Option<Envelope> {
        self.completions_rx.recv().await
    }

    fn apply(&mut self, envelope: Envelope) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if envelope.epoch != self.epoch {
            tracing::debug!(
                issued = envelope.epoch,
                current = self.epoch,
                "Discarding completion from before reset"
            );
            return;
        }

        match envelope.completion {
            Completion::Loaded(result) => self.apply_loaded(result),
            Completion::Saved { id, name, result } => self.apply_saved(id, &name, result),
            Completion::Deleted { name, result } => self.apply_deleted(&name, result),
        }
        self.publish();
    }

    fn apply_saved(&mut self, id: HabitId, name: &str, result: Result<String, StoreError>) {
        match result {
            Ok(remote_id) => {
                tracing::debug!(habit = %name, remote_id = %remote_id, "Habit saved");
                if let Some(habit) = self.habit_mut(id) {
                    if habit.remote_id.is_none() {
                        habit.remote_id = Some(remote_id);
                    }
                    habit.sync_state = SyncState::Clean;
                }
            }
            Err(e) => {
                tracing::warn!(habit = %name, error = %e, "Failed to save habit");
                if let Some(habit) = self.habit_mut(id) {
                    habit.sync_state = SyncState::Failed;
                }
                self.state.last_error = Some(OperationError::save(name, e));
            }
        }
    }

    fn apply_deleted(&mut self, name: &str, result: Result<(), StoreError>) {
        match result {
            Ok(()) => tracing::debug!(habit = %name, "Habit deleted remotely"),
            Err(e) => {
                tracing::warn!(habit = %name, error = %e, "Failed to delete habit");
                self.state.last_error = Some(OperationError::delete(name, e));
            }
        }
    }

    fn habit_mut(&mut self, id: HabitId) -> Option<&mut Habit> {
        self.state.habits.iter_mut().find(|h| h.id == id)
    }

    /// Run `op` as an independent task and route its result back here.
    fn spawn<F>(&mut self, op: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completions_tx.clone();
        let epoch = self.epoch;
        self.in_flight += 1;
        tokio::spawn(async move {
            let completion = op.await;
            let _ = tx.send(Envelope { epoch, completion });
        });
    }

    /// Issue an asynchronous save of the habit with `id`.
    fn queue_save(&mut self, id: HabitId) {
        let Some(habit) = self.state.habits.iter_mut().find(|h| h.id == id) else {
            return;
        };
        let Some(scope) = self.scope.clone() else {
            habit.sync_state = SyncState::Failed;
            let name = habit.name.clone();
            tracing::warn!(habit = %name, "Cannot save habit without a signed-in user");
            self.state.last_error = Some(OperationError::save(name, StoreError::AuthRequired));
            return;
        };
        habit.sync_state = SyncState::Pending;
        let snapshot = habit.clone();
        let store = self.store.clone();
        self.spawn(async move {
            let result = store.save_habit(&snapshot, &scope).await;
            Completion::Saved {
                id: snapshot.id,
                name: snapshot.name,
                result,
            }
        });
    }

    /// Issue an asynchronous delete of an already-removed, persisted habit.
    fn queue_delete(&mut self, habit: Habit) {
        let Some(scope) = self.scope.clone() else {
            tracing::warn!(habit = %habit.name, "Cannot delete habit without a signed-in user");
            self.state.last_error = Some(OperationError::delete(habit.name, StoreError::AuthRequired));
            return;
        };
        let store = self.store.clone();
        self.spawn(async move {
            let result = store.delete_habit(&habit, &scope).await;
            Completion::Deleted {
                name: habit.name,
                result,
            }
        });
    }

    fn update_streak(&mut self) {
        self.streak.update(&self.state.habits);
    }

    fn publish(&self) {
        self.notifier.send_replace(self.snapshot());
    }
}
