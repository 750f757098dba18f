//! Running the coordinator as a task.
//!
//! [`spawn_coordinator`] moves a [`HabitCoordinator`] onto its own tokio
//! task. The task waits on two queues, user commands and remote
//! completions, and handles one item at a time. Callers talk to it through
//! a cloneable [`CoordinatorHandle`] and observe state via the watch
//! channel.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::{Envelope, HabitCoordinator, HabitSnapshot, SessionSignal};
use crate::error::CoreError;
use crate::habit::HabitId;

/// A request from the presentation layer.
#[derive(Debug)]
pub enum Command {
    Activate,
    Load,
    SetInput(String),
    SubmitInput,
    Add(String),
    Toggle(HabitId),
    Delete(Vec<usize>),
    Session(SessionSignal),
    Reset,
    /// Reply once no remote operation is in flight.
    Settle(oneshot::Sender<()>),
    Shutdown,
}

/// Cloneable front end of a spawned coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<HabitSnapshot>,
}

impl CoordinatorHandle {
    pub fn send(&self, command: Command) -> Result<(), CoreError> {
        self.commands
            .send(command)
            .map_err(|_| CoreError::CoordinatorClosed)
    }

    pub fn activate(&self) -> Result<(), CoreError> {
        self.send(Command::Activate)
    }

    pub fn add(&self, name: impl Into<String>) -> Result<(), CoreError> {
        self.send(Command::Add(name.into()))
    }

    pub fn toggle(&self, id: HabitId) -> Result<(), CoreError> {
        self.send(Command::Toggle(id))
    }

    pub fn delete(&self, positions: Vec<usize>) -> Result<(), CoreError> {
        self.send(Command::Delete(positions))
    }

    pub fn session(&self, signal: SessionSignal) -> Result<(), CoreError> {
        self.send(Command::Session(signal))
    }

    /// Wait until every command sent so far has been handled and no remote
    /// operation is in flight.
    pub async fn settle(&self) -> Result<(), CoreError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Settle(tx))?;
        rx.await.map_err(|_| CoreError::CoordinatorClosed)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> HabitSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HabitSnapshot> {
        self.snapshots.clone()
    }

    pub fn shutdown(&self) -> Result<(), CoreError> {
        self.send(Command::Shutdown)
    }
}

/// Move `coordinator` onto its own task.
///
/// The task ends on [`Command::Shutdown`] or when every handle is dropped,
/// and hands the coordinator back through the join handle.
pub fn spawn_coordinator(
    coordinator: HabitCoordinator,
) -> (CoordinatorHandle, JoinHandle<HabitCoordinator>) {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let handle = CoordinatorHandle {
        commands: commands_tx,
        snapshots: coordinator.subscribe(),
    };
    let task = tokio::spawn(run(coordinator, commands_rx));
    (handle, task)
}

enum Next {
    Command(Option<Command>),
    Completion(Option<Envelope>),
}

async fn run(
    mut coordinator: HabitCoordinator,
    mut commands: mpsc::UnboundedReceiver<Command>,
) -> HabitCoordinator {
    let mut waiters: Vec<oneshot::Sender<()>> = Vec::new();

    loop {
        let next = tokio::select! {
            command = commands.recv() => Next::Command(command),
            envelope = coordinator.recv_envelope() => Next::Completion(envelope),
        };

        match next {
            Next::Command(None) | Next::Command(Some(Command::Shutdown)) => break,
            Next::Command(Some(Command::Settle(waiter))) => waiters.push(waiter),
            Next::Command(Some(command)) => coordinator.execute(command),
            Next::Completion(Some(envelope)) => coordinator.apply(envelope),
            Next::Completion(None) => break,
        }

        if coordinator.in_flight() == 0 {
            for waiter in waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }

    tracing::debug!(pending = coordinator.in_flight(), "Coordinator stopped");
    coordinator
}

impl HabitCoordinator {
    /// Apply one command. `Settle` and `Shutdown` are handled by the task
    /// loop and ignored here.
    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Activate => self.activate(),
            Command::Load => self.load(),
            Command::SetInput(text) => self.set_input(text),
            Command::SubmitInput => {
                self.submit_input();
            }
            Command::Add(name) => {
                self.add(&name);
            }
            Command::Toggle(id) => {
                self.toggle(id);
            }
            Command::Delete(positions) => {
                self.delete(&positions);
            }
            Command::Session(signal) => self.handle_session(signal),
            Command::Reset => self.reset(),
            Command::Settle(_) | Command::Shutdown => {}
        }
    }
}
