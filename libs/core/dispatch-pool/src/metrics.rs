//! Pool metrics
//!
//! Recorded through the `metrics` facade; they are no-ops until the host
//! application installs a recorder.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metrics helper labelled with the pool name
#[derive(Clone, Debug)]
pub struct PoolMetrics {
    pool: String,
}

impl PoolMetrics {
    pub fn new(pool: impl Into<String>) -> Self {
        Self { pool: pool.into() }
    }

    /// Record a task accepted by `submit`
    pub fn task_submitted(&self) {
        counter!("dispatch_pool_tasks_submitted_total", "pool" => self.pool.clone()).increment(1);
    }

    /// Record a task refused because the queue was saturated
    pub fn task_rejected(&self) {
        counter!("dispatch_pool_tasks_rejected_total", "pool" => self.pool.clone()).increment(1);
    }

    /// Record a finished task
    pub fn task_finished(&self, status: &'static str, duration: Duration) {
        counter!(
            "dispatch_pool_tasks_finished_total",
            "pool" => self.pool.clone(),
            "status" => status
        )
        .increment(1);

        histogram!(
            "dispatch_pool_task_duration_seconds",
            "pool" => self.pool.clone()
        )
        .record(duration.as_secs_f64());
    }

    /// Record a panic caught by a worker
    pub fn task_panicked(&self) {
        counter!("dispatch_pool_task_panics_total", "pool" => self.pool.clone()).increment(1);
    }

    /// Record tasks dropped by a shutdown timeout
    pub fn tasks_abandoned(&self, count: usize) {
        counter!("dispatch_pool_tasks_abandoned_total", "pool" => self.pool.clone())
            .increment(count as u64);
    }

    /// Update queue depth gauge
    pub fn queue_depth(&self, depth: usize) {
        gauge!("dispatch_pool_queue_depth", "pool" => self.pool.clone()).set(depth as f64);
    }

    /// Update live worker gauge
    pub fn live_workers(&self, count: usize) {
        gauge!("dispatch_pool_live_workers", "pool" => self.pool.clone()).set(count as f64);
    }
}
