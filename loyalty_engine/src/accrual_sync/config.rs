use std::time::Duration;

use crate::accrual_sync::RetryPolicy;

/// Tuning knobs for the [`crate::accrual_sync::AccrualSyncCoordinator`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// The minimum time between two dispatched lookups. Zero disables throttling.
    pub dispatch_interval: Duration,
    /// The maximum number of lookups in flight at once.
    pub max_workers: usize,
    /// Backoff for failed lookups and failed updates.
    pub retry: RetryPolicy,
    /// How long to wait before polling an order that is still `REGISTERED` or `PROCESSING`.
    pub poll_delay: Duration,
    /// How long to wait before asking about an order the accrual system has not heard of yet.
    pub unknown_order_delay: Duration,
    /// How often to reload unsettled orders from the database. `None` disables rescans.
    pub rescan_interval: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            dispatch_interval: Duration::from_secs(1),
            max_workers: 8,
            retry: RetryPolicy::default(),
            poll_delay: Duration::from_secs(5),
            unknown_order_delay: Duration::from_secs(30),
            rescan_interval: Some(Duration::from_secs(300)),
        }
    }
}

impl SyncConfig {
    pub fn with_dispatch_interval(mut self, interval: Duration) -> Self {
        self.dispatch_interval = interval;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub fn with_unknown_order_delay(mut self, delay: Duration) -> Self {
        self.unknown_order_delay = delay;
        self
    }

    /// A zero interval disables rescans.
    pub fn with_rescan_interval(mut self, interval: Option<Duration>) -> Self {
        self.rescan_interval = interval.filter(|d| !d.is_zero());
        self
    }
}
