//! Dispatch errors

use thiserror::Error;

/// Errors returned synchronously by `DispatchPool::submit`.
///
/// Failures that happen while a task runs never surface here; they go to the
/// pool's failure sink.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Queue full, worker ceiling reached and the policy is `Reject`
    #[error("Dispatch queue saturated (capacity {capacity})")]
    QueueSaturated { capacity: usize },

    /// The pool no longer accepts tasks
    #[error("Dispatch pool is shut down")]
    ShutDown,
}
