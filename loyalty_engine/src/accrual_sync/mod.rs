//! # Accrual synchronization
//!
//! Orders are registered long before the accrual system has decided how many points they earn. The
//! [`AccrualSyncCoordinator`] drives every registered order to a terminal status:
//!
//! * Order numbers are submitted through a [`SyncHandle`]. Submitting an order that is already being tracked is a
//!   no-op, so there is never more than one lookup in flight for an order.
//! * A single dispatcher drains the queue, at most one job per `dispatch_interval`, and hands each job to a worker.
//!   At most `max_workers` workers run at any time.
//! * A worker looks the order up with the [`crate::traits::AccrualProvider`] and applies the outcome with
//!   [`crate::traits::OrderManagement::apply_accrual_result`]. Orders that are not final yet are polled again later.
//!   Failures are retried with exponential backoff ([`RetryPolicy`]) until the retry budget runs out.
//! * The database, not the queue, is the source of truth. On start-up (and every `rescan_interval`) all unsettled
//!   orders are read from the database and submitted again.
//!
//! Failures are reported through [`crate::events::SyncErrorEvent`]s and never reach whoever submitted the order.
mod config;
mod coordinator;
mod queue;
mod retry_policy;

pub use config::SyncConfig;
pub use coordinator::{AccrualSyncCoordinator, CoordinatorHandle};
pub use queue::{SyncHandle, SyncJob};
pub use retry_policy::RetryPolicy;
