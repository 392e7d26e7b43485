//! Dispatch Pool
//!
//! A bounded, in-process worker pool for fire-and-forget background work such
//! as sending e-mail.
//!
//! ## Features
//!
//! - **Bounded queue**: `queue_capacity` slots, `core_workers` always running
//! - **Elastic workers**: grows up to `max_workers` when the queue is full,
//!   extra workers retire after `keep_alive` idle time
//! - **Saturation policy**: `Block` (default) waits for room, `Reject` fails fast
//! - **Failure isolation**: per-item faults and panics go to a `FailureSink`,
//!   never to the submitter, and never kill a worker
//! - **Graceful drain**: `shutdown()` finishes queued work within a timeout and
//!   reports what was abandoned
//!
//! Panic isolation needs unwinding panics. Building with `panic = "abort"`
//! is rejected at compile time.
//!
//! ## Example
//!
//! ```ignore
//! use dispatch_pool::{DispatchPool, PoolConfig, PoolTask, TaskContext, TaskOutcome};
//!
//! let pool = DispatchPool::new(PoolConfig::new("mail").with_core_workers(2));
//! let mut ticket = pool.submit(MyTask::new()).await?;
//! let state = ticket.finished().await;
//! pool.shutdown().await;
//! ```

#[cfg(panic = "abort")]
compile_error!("dispatch-pool catches task panics and requires `panic = \"unwind\"`");

mod config;
mod error;
pub mod metrics;
mod pool;
mod sink;
mod task;

pub use config::{PoolConfig, SaturationPolicy};
pub use error::DispatchError;
pub use metrics::PoolMetrics;
pub use pool::{DispatchPool, ShutdownReport};
pub use sink::{DeliveryFault, FailureSink, LogFailureSink};
pub use task::{PoolTask, TaskContext, TaskOutcome, TaskState, TaskTicket};
