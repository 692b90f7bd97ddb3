//! Per-node time budget.
//!
//! The budget is cooperative: drivers check it between entry steps, so an
//! escalate-and-retry cycle that has started always runs to completion.
//!
//! # Examples
//!
//! ```
//! use engine::timeout::{NodeTimer, TimeoutConfig};
//! use std::time::Duration;
//!
//! let config = TimeoutConfig::new().with_node_timeout(30);
//! assert_eq!(config.node_timeout(), Some(Duration::from_secs(30)));
//!
//! let timer = NodeTimer::start(config);
//! assert!(timer.check().is_ok());
//! ```

use std::fmt;
use std::time::{Duration, Instant};

/// Configuration of the per-node budget. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutConfig {
    node_timeout: Option<Duration>,
}

impl TimeoutConfig {
    /// Creates a configuration with no budget.
    #[must_use]
    pub const fn new() -> Self {
        Self { node_timeout: None }
    }

    /// Sets the budget in seconds. A value of 0 disables it.
    #[must_use]
    pub const fn with_node_timeout(mut self, seconds: u64) -> Self {
        self.node_timeout = if seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(seconds))
        };
        self
    }

    /// Sets the budget directly.
    #[must_use]
    pub const fn with_duration(mut self, budget: Option<Duration>) -> Self {
        self.node_timeout = budget;
        self
    }

    /// The configured budget.
    #[must_use]
    pub const fn node_timeout(&self) -> Option<Duration> {
        self.node_timeout
    }

    /// Returns `true` if a budget is set.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.node_timeout.is_some()
    }
}

/// Tracks the time spent on the current node.
#[derive(Debug, Clone, Copy)]
pub struct NodeTimer {
    config: TimeoutConfig,
    started: Instant,
}

impl NodeTimer {
    /// Starts timing a node.
    #[must_use]
    pub fn start(config: TimeoutConfig) -> Self {
        Self {
            config,
            started: Instant::now(),
        }
    }

    /// Time spent on the node so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fails once the budget is exhausted.
    pub fn check(&self) -> Result<(), TimeoutError> {
        if let Some(limit) = self.config.node_timeout {
            let elapsed = self.elapsed();
            if elapsed >= limit {
                return Err(TimeoutError { elapsed, limit });
            }
        }
        Ok(())
    }
}

/// The node's budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutError {
    /// Time spent on the node.
    pub elapsed: Duration,
    /// The configured budget.
    pub limit: Duration,
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node time budget of {}s exhausted after {:.1}s",
            self.limit.as_secs(),
            self.elapsed.as_secs_f64()
        )
    }
}

impl std::error::Error for TimeoutError {}
