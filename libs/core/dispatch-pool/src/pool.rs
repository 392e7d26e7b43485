//! The dispatch pool: bounded queue, core + elastic workers, graceful drain.
//!
//! Workers are tokio tasks sharing one bounded mpsc receiver. `submit` only
//! waits when the queue is full, the pool is at `max_workers` and the policy
//! is `Block`. Before any policy applies the pool grows by one elastic worker
//! which takes the submitted task directly.

use crate::config::{PoolConfig, SaturationPolicy};
use crate::error::DispatchError;
use crate::metrics::PoolMetrics;
use crate::sink::{DeliveryFault, FailureSink, LogFailureSink};
use crate::task::{PoolTask, TaskContext, TaskState, TaskTicket};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex as AsyncMutex, mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A task waiting in the queue, with the channel its ticket observes.
struct Queued {
    task: Box<dyn PoolTask>,
    state: Arc<watch::Sender<TaskState>>,
}

/// State shared by every worker.
struct Shared {
    name: String,
    receiver: AsyncMutex<mpsc::Receiver<Queued>>,
    sink: Arc<dyn FailureSink>,
    in_flight: Mutex<HashMap<Uuid, Arc<watch::Sender<TaskState>>>>,
    queued: AtomicUsize,
    live_workers: AtomicUsize,
    metrics: PoolMetrics,
}

/// Outcome of trying to add an elastic worker for an overflowing task.
enum Grow {
    Spawned,
    AtCapacity(Queued),
    ShutDown,
}

/// Result of [`DispatchPool::shutdown`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Every queued and in-flight task finished within the timeout
    pub drained: bool,
    /// Tasks dropped because the timeout elapsed (in flight first, then queued)
    pub abandoned: Vec<Uuid>,
}

/// Bounded worker pool for fire-and-forget tasks.
///
/// Create it once per process and share it (`Arc<DispatchPool>`). Dropping
/// it without calling [`shutdown`](Self::shutdown) detaches the workers; they
/// finish whatever is queued and then exit.
pub struct DispatchPool {
    config: PoolConfig,
    sender: Mutex<Option<mpsc::Sender<Queued>>>,
    shared: Arc<Shared>,
    workers: Mutex<JoinSet<()>>,
    accepting: AtomicBool,
}

impl DispatchPool {
    /// Start a pool that logs failures.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: PoolConfig) -> Self {
        Self::with_sink(config, Arc::new(LogFailureSink))
    }

    /// Start a pool with a custom failure sink.
    pub fn with_sink(config: PoolConfig, sink: Arc<dyn FailureSink>) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity);

        let shared = Arc::new(Shared {
            name: config.name.clone(),
            receiver: AsyncMutex::new(receiver),
            sink,
            in_flight: Mutex::new(HashMap::new()),
            queued: AtomicUsize::new(0),
            live_workers: AtomicUsize::new(0),
            metrics: PoolMetrics::new(config.name.clone()),
        });

        let mut workers = JoinSet::new();
        for _ in 0..config.core_workers {
            shared.live_workers.fetch_add(1, Ordering::SeqCst);
            workers.spawn(worker_loop(Arc::clone(&shared), None, None));
        }
        shared.metrics.live_workers(config.core_workers);

        info!(
            pool = %config.name,
            core_workers = %config.core_workers,
            max_workers = %config.max_workers,
            queue_capacity = %config.queue_capacity,
            saturation = %config.saturation,
            "Dispatch pool started"
        );

        Self {
            config,
            sender: Mutex::new(Some(sender)),
            shared,
            workers: Mutex::new(workers),
            accepting: AtomicBool::new(true),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Tasks waiting in the queue.
    pub fn queued(&self) -> usize {
        self.shared.queued.load(Ordering::SeqCst)
    }

    /// Tasks currently executing.
    pub fn in_flight(&self) -> usize {
        lock(&self.shared.in_flight).len()
    }

    /// Core plus elastic workers alive right now.
    pub fn live_workers(&self) -> usize {
        self.shared.live_workers.load(Ordering::SeqCst)
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Enqueue a task and return immediately with its ticket.
    pub async fn submit<T: PoolTask>(&self, task: T) -> Result<TaskTicket, DispatchError> {
        self.submit_boxed(Box::new(task)).await
    }

    /// [`submit`](Self::submit) for an already boxed task.
    pub async fn submit_boxed(&self, task: Box<dyn PoolTask>) -> Result<TaskTicket, DispatchError> {
        if !self.is_accepting() {
            return Err(DispatchError::ShutDown);
        }
        let Some(sender) = lock(&self.sender).clone() else {
            return Err(DispatchError::ShutDown);
        };

        let id = task.task_id();
        let (state_tx, state_rx) = watch::channel(TaskState::Created);
        let ticket = TaskTicket::new(id, state_rx);
        let item = Queued {
            task,
            state: Arc::new(state_tx),
        };

        match sender.try_reserve() {
            Ok(permit) => {
                self.enqueue(permit, item);
                return Ok(ticket);
            }
            Err(TrySendError::Closed(())) => return Err(DispatchError::ShutDown),
            Err(TrySendError::Full(())) => {}
        }

        let item = match self.grow(item) {
            Grow::Spawned => {
                self.shared.metrics.task_submitted();
                return Ok(ticket);
            }
            Grow::ShutDown => return Err(DispatchError::ShutDown),
            Grow::AtCapacity(item) => item,
        };

        match self.config.saturation {
            SaturationPolicy::Reject => {
                self.shared.metrics.task_rejected();
                warn!(
                    pool = %self.config.name,
                    task_id = %id,
                    capacity = %self.config.queue_capacity,
                    "Dispatch queue saturated, rejecting task"
                );
                Err(DispatchError::QueueSaturated {
                    capacity: self.config.queue_capacity,
                })
            }
            SaturationPolicy::Block => {
                debug!(
                    pool = %self.config.name,
                    task_id = %id,
                    "Dispatch queue saturated, waiting for room"
                );
                let permit = sender
                    .reserve()
                    .await
                    .map_err(|_| DispatchError::ShutDown)?;
                self.enqueue(permit, item);
                Ok(ticket)
            }
        }
    }

    fn enqueue(&self, permit: mpsc::Permit<'_, Queued>, item: Queued) {
        item.state.send_replace(TaskState::Queued);
        let depth = self.shared.queued.fetch_add(1, Ordering::SeqCst) + 1;
        let id = item.task.task_id();
        permit.send(item);

        self.shared.metrics.task_submitted();
        self.shared.metrics.queue_depth(depth);
        debug!(pool = %self.config.name, task_id = %id, queued = %depth, "Task queued");
    }

    /// Spawn an elastic worker that starts with `item`, if below `max_workers`.
    fn grow(&self, item: Queued) -> Grow {
        let max = self.config.max_workers;
        let grown = self
            .shared
            .live_workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                (live < max).then_some(live + 1)
            });

        let Ok(previous) = grown else {
            return Grow::AtCapacity(item);
        };

        // `shutdown` flips the flag before taking the join set, so checking
        // under the lock keeps every spawned worker inside the set it drains.
        let mut workers = lock(&self.workers);
        if !self.is_accepting() {
            self.shared.live_workers.fetch_sub(1, Ordering::SeqCst);
            return Grow::ShutDown;
        }
        while workers.try_join_next().is_some() {}

        item.state.send_replace(TaskState::Queued);
        workers.spawn(worker_loop(
            Arc::clone(&self.shared),
            Some(item),
            Some(self.config.keep_alive),
        ));

        self.shared.metrics.live_workers(previous + 1);
        debug!(
            pool = %self.config.name,
            live_workers = %(previous + 1),
            "Queue full, spawned elastic worker"
        );
        Grow::Spawned
    }

    /// Stop accepting tasks and drain.
    ///
    /// Waits up to `shutdown_timeout` for queued and in-flight tasks. On
    /// timeout the workers are aborted and the ids of every task that did
    /// not finish are logged and returned.
    pub async fn shutdown(&self) -> ShutdownReport {
        self.accepting.store(false, Ordering::SeqCst);
        drop(lock(&self.sender).take());
        let mut workers = std::mem::take(&mut *lock(&self.workers));

        info!(
            pool = %self.config.name,
            queued = %self.queued(),
            in_flight = %self.in_flight(),
            "Shutting down dispatch pool"
        );

        let drain = async { while workers.join_next().await.is_some() {} };
        if tokio::time::timeout(self.config.shutdown_timeout, drain)
            .await
            .is_ok()
        {
            info!(pool = %self.config.name, "Dispatch pool drained");
            return ShutdownReport {
                drained: true,
                abandoned: Vec::new(),
            };
        }

        workers.abort_all();
        while workers.join_next().await.is_some() {}
        self.shared.live_workers.store(0, Ordering::SeqCst);
        self.shared.metrics.live_workers(0);

        let mut abandoned = Vec::new();
        for (id, state) in lock(&self.shared.in_flight).drain() {
            state.send_replace(TaskState::Abandoned);
            abandoned.push(id);
        }

        let mut receiver = self.shared.receiver.lock().await;
        receiver.close();
        while let Ok(item) = receiver.try_recv() {
            item.state.send_replace(TaskState::Abandoned);
            abandoned.push(item.task.task_id());
        }
        self.shared.queued.store(0, Ordering::SeqCst);

        self.shared.metrics.tasks_abandoned(abandoned.len());
        warn!(
            pool = %self.config.name,
            timeout_secs = %self.config.shutdown_timeout.as_secs_f64(),
            abandoned = ?abandoned,
            "Dispatch pool shutdown timed out, tasks abandoned"
        );

        ShutdownReport {
            drained: false,
            abandoned,
        }
    }
}

impl Drop for DispatchPool {
    fn drop(&mut self) {
        lock(&self.workers).detach_all();
    }
}

async fn worker_loop(shared: Arc<Shared>, first: Option<Queued>, keep_alive: Option<Duration>) {
    if let Some(item) = first {
        shared.run(item).await;
    }

    loop {
        let next = match keep_alive {
            None => shared.next().await,
            Some(idle) => match tokio::time::timeout(idle, shared.next()).await {
                Ok(next) => next,
                Err(_) => {
                    debug!(pool = %shared.name, "Elastic worker idle, retiring");
                    break;
                }
            },
        };

        let Some(item) = next else {
            break;
        };

        let depth = shared.queued.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        shared.metrics.queue_depth(depth);
        shared.run(item).await;
    }

    let live = shared.live_workers.fetch_sub(1, Ordering::SeqCst) - 1;
    shared.metrics.live_workers(live);
}

impl Shared {
    async fn next(&self) -> Option<Queued> {
        self.receiver.lock().await.recv().await
    }

    /// Run one task to a terminal state.
    ///
    /// Panics are caught here and reported as [`DeliveryFault::Uncaught`];
    /// this only works when panics unwind.
    async fn run(&self, item: Queued) {
        let Queued { task, state } = item;
        let id = task.task_id();

        lock(&self.in_flight).insert(id, Arc::clone(&state));
        state.send_replace(TaskState::InFlight);

        let ctx = TaskContext::new(id, Arc::clone(&self.sink));
        let started = Instant::now();

        let finished = match AssertUnwindSafe(task.execute(&ctx)).catch_unwind().await {
            Ok(outcome) if outcome.has_failures() => {
                debug!(
                    pool = %self.name,
                    task_id = %id,
                    attempted = %outcome.attempted,
                    failed = %outcome.failed,
                    "Task finished with isolated failures"
                );
                TaskState::FailedIsolated
            }
            Ok(outcome) => {
                debug!(
                    pool = %self.name,
                    task_id = %id,
                    attempted = %outcome.attempted,
                    "Task completed"
                );
                TaskState::Completed
            }
            Err(payload) => {
                self.metrics.task_panicked();
                ctx.report(DeliveryFault::Uncaught {
                    cause: panic_message(&*payload),
                });
                TaskState::FailedIsolated
            }
        };

        lock(&self.in_flight).remove(&id);
        let status = match finished {
            TaskState::Completed => "completed",
            _ => "failed_isolated",
        };
        self.metrics.task_finished(status, started.elapsed());
        state.send_replace(finished);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
