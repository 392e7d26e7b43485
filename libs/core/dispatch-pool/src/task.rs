//! Task contract and lifecycle tracking
//!
//! - `PoolTask`: a unit of work consumed by exactly one worker
//! - `TaskContext`: what a running task can reach (its id, the failure sink)
//! - `TaskTicket`: the caller's read-only view of a submitted task

use crate::sink::{DeliveryFault, FailureSink};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

/// Unit of work executed by the dispatch pool.
///
/// Implementors own everything they need; `execute` consumes the task so it
/// cannot be run twice.
///
/// # Example
///
/// ```rust,ignore
/// struct Ping { id: Uuid }
///
/// #[async_trait]
/// impl PoolTask for Ping {
///     fn task_id(&self) -> Uuid {
///         self.id
///     }
///
///     async fn execute(self: Box<Self>, _ctx: &TaskContext) -> TaskOutcome {
///         TaskOutcome::new(1, 0)
///     }
/// }
/// ```
#[async_trait]
pub trait PoolTask: Send + 'static {
    fn task_id(&self) -> Uuid;

    /// Run the task. Per-item failures go through `ctx.report` and are counted
    /// in the returned outcome.
    async fn execute(self: Box<Self>, ctx: &TaskContext) -> TaskOutcome;
}

/// Handed to a task while it runs.
pub struct TaskContext {
    task_id: Uuid,
    sink: Arc<dyn FailureSink>,
}

impl TaskContext {
    pub(crate) fn new(task_id: Uuid, sink: Arc<dyn FailureSink>) -> Self {
        Self { task_id, sink }
    }

    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    /// Send a fault to the pool's failure sink.
    pub fn report(&self, fault: DeliveryFault) {
        self.sink.on_failure(self.task_id, &fault);
    }
}

/// How many items a task attempted and how many of them failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskOutcome {
    pub attempted: usize,
    pub failed: usize,
}

impl TaskOutcome {
    pub fn new(attempted: usize, failed: usize) -> Self {
        Self { attempted, failed }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Lifecycle of a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Created,
    Queued,
    InFlight,
    Completed,
    /// At least one item failed, or the task panicked
    FailedIsolated,
    /// Dropped by a shutdown that ran out of time
    Abandoned,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::FailedIsolated | TaskState::Abandoned
        )
    }
}

/// Returned by `submit`; callers may drop it without affecting the task.
#[derive(Debug, Clone)]
pub struct TaskTicket {
    id: Uuid,
    state: watch::Receiver<TaskState>,
}

impl TaskTicket {
    pub(crate) fn new(id: Uuid, state: watch::Receiver<TaskState>) -> Self {
        Self { id, state }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state.
    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// Wait until the task reaches a terminal state.
    ///
    /// If the pool goes away before that, returns the last state observed.
    pub async fn finished(&mut self) -> TaskState {
        let reached = self
            .state
            .wait_for(TaskState::is_terminal)
            .await
            .map(|state| *state);

        reached.unwrap_or_else(|_| *self.state.borrow())
    }
}
