//! Pool configuration
//!
//! This module provides `PoolConfig` for sizing the dispatch pool.

use core_config::{ConfigError, FromEnv, env_or_default, env_parse};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What `submit` does when the queue is full and the pool cannot grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaturationPolicy {
    /// Wait until a worker frees a slot
    #[default]
    Block,
    /// Fail immediately with `DispatchError::QueueSaturated`
    Reject,
}

impl FromStr for SaturationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown saturation policy '{}'", other)),
        }
    }
}

impl fmt::Display for SaturationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => f.write_str("block"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// Configuration for the dispatch pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Pool name for logs and metric labels
    pub name: String,

    /// Workers started with the pool and kept until shutdown
    pub core_workers: usize,

    /// Upper bound including elastic workers
    pub max_workers: usize,

    /// Bounded queue size
    pub queue_capacity: usize,

    /// Behaviour when the queue is full and `max_workers` is reached
    pub saturation: SaturationPolicy,

    /// Idle time after which an elastic worker retires
    pub keep_alive: Duration,

    /// Upper bound on the graceful drain during shutdown
    pub shutdown_timeout: Duration,
}

impl PoolConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            core_workers: 5,
            max_workers: 10,
            queue_capacity: 100,
            saturation: SaturationPolicy::Block,
            keep_alive: Duration::from_secs(60),
            shutdown_timeout: Duration::from_secs(30),
        }
    }

    /// Set the number of core workers (raises `max_workers` if needed)
    pub fn with_core_workers(mut self, count: usize) -> Self {
        self.core_workers = count.max(1);
        self.max_workers = self.max_workers.max(self.core_workers);
        self
    }

    /// Set the worker ceiling (never below `core_workers`)
    pub fn with_max_workers(mut self, count: usize) -> Self {
        self.max_workers = count.max(self.core_workers);
        self
    }

    /// Set the queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the saturation policy
    pub fn with_saturation(mut self, policy: SaturationPolicy) -> Self {
        self.saturation = policy;
        self
    }

    /// Set the elastic worker keep-alive
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Set the shutdown drain timeout
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new("mail-dispatch")
    }
}

impl FromEnv for PoolConfig {
    /// - DISPATCH_POOL_NAME: defaults to "mail-dispatch"
    /// - DISPATCH_CORE_WORKERS: defaults to 5
    /// - DISPATCH_MAX_WORKERS: defaults to 10
    /// - DISPATCH_QUEUE_CAPACITY: defaults to 100
    /// - DISPATCH_SATURATION: "block" (default) or "reject"
    /// - DISPATCH_KEEP_ALIVE_SECS: defaults to 60
    /// - DISPATCH_SHUTDOWN_TIMEOUT_SECS: defaults to 30
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self::new(env_or_default("DISPATCH_POOL_NAME", &defaults.name))
            .with_core_workers(env_parse("DISPATCH_CORE_WORKERS", defaults.core_workers)?)
            .with_max_workers(env_parse("DISPATCH_MAX_WORKERS", defaults.max_workers)?)
            .with_queue_capacity(env_parse(
                "DISPATCH_QUEUE_CAPACITY",
                defaults.queue_capacity,
            )?)
            .with_saturation(env_parse("DISPATCH_SATURATION", defaults.saturation)?)
            .with_keep_alive(Duration::from_secs(env_parse(
                "DISPATCH_KEEP_ALIVE_SECS",
                defaults.keep_alive.as_secs(),
            )?))
            .with_shutdown_timeout(Duration::from_secs(env_parse(
                "DISPATCH_SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout.as_secs(),
            )?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.core_workers, 5);
        assert_eq!(config.max_workers, 10);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.saturation, SaturationPolicy::Block);
    }

    #[test]
    fn test_builder_pattern() {
        let config = PoolConfig::new("reports")
            .with_core_workers(2)
            .with_max_workers(4)
            .with_queue_capacity(0)
            .with_saturation(SaturationPolicy::Reject);

        assert_eq!(config.name, "reports");
        assert_eq!(config.core_workers, 2);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.queue_capacity, 1);
        assert_eq!(config.saturation, SaturationPolicy::Reject);
    }

    #[test]
    fn test_max_never_below_core() {
        let config = PoolConfig::new("p").with_core_workers(3).with_max_workers(1);
        assert_eq!(config.max_workers, 3);

        let config = PoolConfig::new("p").with_core_workers(12);
        assert_eq!(config.max_workers, 12);
    }

    #[test]
    fn test_saturation_policy_parse() {
        assert_eq!("Block".parse::<SaturationPolicy>(), Ok(SaturationPolicy::Block));
        assert_eq!(" reject ".parse::<SaturationPolicy>(), Ok(SaturationPolicy::Reject));
        assert!("drop".parse::<SaturationPolicy>().is_err());
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("DISPATCH_POOL_NAME", None),
                ("DISPATCH_CORE_WORKERS", Some("2")),
                ("DISPATCH_MAX_WORKERS", Some("3")),
                ("DISPATCH_QUEUE_CAPACITY", Some("7")),
                ("DISPATCH_SATURATION", Some("reject")),
                ("DISPATCH_KEEP_ALIVE_SECS", Some("5")),
                ("DISPATCH_SHUTDOWN_TIMEOUT_SECS", None),
            ],
            || {
                let config = PoolConfig::from_env().unwrap();

                assert_eq!(config.name, "mail-dispatch");
                assert_eq!(config.core_workers, 2);
                assert_eq!(config.max_workers, 3);
                assert_eq!(config.queue_capacity, 7);
                assert_eq!(config.saturation, SaturationPolicy::Reject);
                assert_eq!(config.keep_alive, Duration::from_secs(5));
                assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
            },
        );
    }

    #[test]
    fn test_from_env_invalid_policy() {
        temp_env::with_var("DISPATCH_SATURATION", Some("drop"), || {
            let result = PoolConfig::from_env();
            assert!(matches!(result, Err(ConfigError::ParseError { .. })));
        });
    }
}
