//! Failure sink: where asynchronous delivery faults end up
//!
//! Nothing a worker does can reach the caller of `submit`, so every fault is
//! handed to a [`FailureSink`] together with the id of the task it came from.

use std::fmt;
use tracing::error;
use uuid::Uuid;

/// A fault raised while a task was running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryFault {
    /// One item of the task failed; the remaining items were still attempted
    Isolated {
        /// What failed, e.g. the message subject
        item: String,
        /// Extra context, e.g. masked recipients
        detail: String,
        cause: String,
    },

    /// The task panicked
    Uncaught { cause: String },
}

impl DeliveryFault {
    /// Log message for this kind of fault, independent of what the task does.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Isolated { .. } => "Task item failed",
            Self::Uncaught { .. } => "Uncaught failure in dispatch worker",
        }
    }
}

impl fmt::Display for DeliveryFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Isolated {
                item,
                detail,
                cause,
            } => write!(f, "{} ({}) failed: {}", item, detail, cause),
            Self::Uncaught { cause } => write!(f, "task panicked: {}", cause),
        }
    }
}

/// Receives every fault produced by pool workers.
pub trait FailureSink: Send + Sync {
    fn on_failure(&self, task_id: Uuid, fault: &DeliveryFault);
}

impl<F> FailureSink for F
where
    F: Fn(Uuid, &DeliveryFault) + Send + Sync,
{
    fn on_failure(&self, task_id: Uuid, fault: &DeliveryFault) {
        self(task_id, fault)
    }
}

/// Default sink: logs each fault at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailureSink;

impl FailureSink for LogFailureSink {
    fn on_failure(&self, task_id: Uuid, fault: &DeliveryFault) {
        match fault {
            DeliveryFault::Isolated {
                item,
                detail,
                cause,
            } => error!(
                task_id = %task_id,
                item = %item,
                detail = %detail,
                cause = %cause,
                "{}",
                fault.summary()
            ),
            DeliveryFault::Uncaught { cause } => error!(
                task_id = %task_id,
                cause = %cause,
                "{}",
                fault.summary()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_is_a_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |id: Uuid, fault: &DeliveryFault| seen.lock().unwrap().push((id, fault.clone()));

        let id = Uuid::new_v4();
        sink.on_failure(
            id,
            &DeliveryFault::Uncaught {
                cause: "boom".into(),
            },
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, id);
    }

    #[test]
    fn test_fault_display() {
        let fault = DeliveryFault::Isolated {
            item: "Invoice".into(),
            detail: "a***@example.com".into(),
            cause: "connection refused".into(),
        };

        assert_eq!(
            fault.to_string(),
            "Invoice (a***@example.com) failed: connection refused"
        );
    }

    #[test]
    fn test_fault_summary_is_task_neutral() {
        let isolated = DeliveryFault::Isolated {
            item: "Invoice".into(),
            detail: "a***@example.com".into(),
            cause: "connection refused".into(),
        };
        let uncaught = DeliveryFault::Uncaught {
            cause: "boom".into(),
        };

        assert_eq!(isolated.summary(), "Task item failed");
        assert_eq!(uncaught.summary(), "Uncaught failure in dispatch worker");
        for fault in [&isolated, &uncaught] {
            assert!(!fault.summary().to_lowercase().contains("mail"));
        }
    }
}
