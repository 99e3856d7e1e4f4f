use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LifecycleState {
    Created,
    Running,
    Stopped,
}

impl LifecycleState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LifecycleState::Created,
            1 => LifecycleState::Running,
            _ => LifecycleState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            LifecycleState::Created => 0,
            LifecycleState::Running => 1,
            LifecycleState::Stopped => 2,
        }
    }
}

/// `Created -> Running -> Stopped` gate shared between a component's handle
/// and its callers.
///
/// Invariants:
/// - every transition is a single compare-and-swap, so exactly one caller wins it
/// - a stopped component never runs again
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Created.as_u8()),
        }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Returns true for the one caller that moved `Created -> Running`.
    pub fn try_start(&self) -> bool {
        self.transition(LifecycleState::Created, LifecycleState::Running)
    }

    /// Returns true for the one caller that moved `Running -> Stopped`.
    /// Stopping a component that never started is a no-op.
    pub fn try_stop(&self) -> bool {
        self.transition(LifecycleState::Running, LifecycleState::Stopped)
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot handoff of an event loop's owned state into a spawned task.
///
/// The loop state sits in `pending` until the first `spawn`, after which the
/// task exclusively owns it. The mutexes are only touched at start and join.
pub(crate) struct LoopTask<L> {
    pending: Mutex<Option<L>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<L: Send + 'static> LoopTask<L> {
    pub(crate) fn new(state: L) -> Self {
        Self {
            pending: Mutex::new(Some(state)),
            handle: Mutex::new(None),
        }
    }

    /// Spawns `run(state)` on the current Tokio runtime. Only the first call
    /// spawns anything.
    pub(crate) fn spawn<F, Fut>(&self, run: F)
    where
        F: FnOnce(L) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Some(state) = lock(&self.pending).take() else {
            return;
        };
        let handle = tokio::spawn(run(state));
        *lock(&self.handle) = Some(handle);
    }

    /// Waits for the spawned task to finish. Returns immediately if the task
    /// was never spawned or has already been joined.
    pub(crate) async fn join(&self, name: &'static str) {
        let Some(handle) = lock(&self.handle).take() else {
            return;
        };
        if let Err(e) = handle.await {
            warn!(task = name, error = %e, "event loop task did not exit cleanly");
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
