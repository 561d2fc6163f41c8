use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use log::*;
use tokio::sync::{mpsc, watch};

use crate::db_types::OrderNumber;

/// A pending accrual lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncJob {
    pub order_number: OrderNumber,
    /// The number of consecutive failed lookups for the order.
    pub attempt: u32,
}

impl SyncJob {
    pub fn new(order_number: OrderNumber) -> Self {
        Self { order_number, attempt: 0 }
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }
}

/// The submission side of the accrual sync queue. Cheap to clone.
///
/// Every order number in the queue, waiting to be re-queued, or being looked up by a worker is *tracked*. An order
/// number can only be submitted once while it is tracked.
#[derive(Clone)]
pub struct SyncHandle {
    sender: mpsc::UnboundedSender<SyncJob>,
    tracked: Arc<Mutex<HashSet<OrderNumber>>>,
}

impl SyncHandle {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<SyncJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = Self { sender, tracked: Arc::new(Mutex::new(HashSet::new())) };
        (handle, receiver)
    }

    fn tracked(&self) -> MutexGuard<'_, HashSet<OrderNumber>> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the order for an accrual lookup. Never blocks.
    ///
    /// Returns `false` if the order is already tracked, or if the coordinator has shut down.
    pub fn submit(&self, order_number: &OrderNumber) -> bool {
        let mut tracked = self.tracked();
        if !tracked.insert(order_number.clone()) {
            trace!("🔄️ Order {order_number} is already queued for an accrual lookup");
            return false;
        }
        if self.sender.send(SyncJob::new(order_number.clone())).is_err() {
            tracked.remove(order_number);
            warn!("🔄️ Accrual sync has shut down. Order {order_number} was not queued");
            return false;
        }
        trace!("🔄️ Order {order_number} queued for an accrual lookup");
        true
    }

    pub fn is_tracked(&self, order_number: &OrderNumber) -> bool {
        self.tracked().contains(order_number)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked().len()
    }

    /// Puts an already tracked job back at the end of the queue.
    pub(crate) fn requeue(&self, job: SyncJob) {
        let order_number = job.order_number.clone();
        if self.sender.send(job).is_err() {
            debug!("🔄️ Accrual sync has shut down. Dropping order {order_number}");
            self.untrack(&order_number);
        }
    }

    /// Re-queues the job once `delay` has passed, unless the coordinator is shut down in the meantime.
    pub(crate) fn requeue_after(&self, job: SyncJob, delay: Duration, mut shutdown: watch::Receiver<bool>) {
        if delay.is_zero() {
            self.requeue(job);
            return;
        }
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => handle.requeue(job),
                _ = shutdown.changed() => handle.untrack(&job.order_number),
            }
        });
    }

    pub(crate) fn untrack(&self, order_number: &OrderNumber) {
        self.tracked().remove(order_number);
    }
}
