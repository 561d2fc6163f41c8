use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use accrual_client::{AccrualApiError, AccrualLookup};
use log::*;
use tokio::{
    sync::{mpsc, watch, OwnedSemaphorePermit, Semaphore},
    task::{JoinError, JoinHandle, JoinSet},
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};

use crate::{
    accrual_sync::{SyncConfig, SyncHandle, SyncJob},
    db_types::OrderNumber,
    events::{AccrualAppliedEvent, EventProducers, SyncErrorEvent},
    traits::{AccrualApplyResult, AccrualProvider, AccrualUpdate, OrderManagement, OrderManagementError},
};

/// Polls the accrual system for unsettled orders and applies the results. See the [module docs](super) for details.
pub struct AccrualSyncCoordinator<B, P> {
    db: B,
    provider: P,
    config: SyncConfig,
    producers: EventProducers,
    queue: SyncHandle,
    receiver: mpsc::UnboundedReceiver<SyncJob>,
}

/// Controls a running [`AccrualSyncCoordinator`]. Dropping the handle also stops the coordinator.
pub struct CoordinatorHandle {
    queue: SyncHandle,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl CoordinatorHandle {
    pub fn sync_handle(&self) -> SyncHandle {
        self.queue.clone()
    }

    pub fn submit(&self, order_number: &OrderNumber) -> bool {
        self.queue.submit(order_number)
    }

    /// Stops dispatching, abandons lookups that are still waiting on the accrual system and waits for database updates
    /// that are already under way to complete.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        info!("🔄️ Shutting down accrual sync");
        let _ = self.shutdown.send(true);
        self.task.await
    }
}

/// Shared state handed to each worker.
struct WorkerContext<B, P> {
    db: B,
    provider: P,
    config: SyncConfig,
    producers: EventProducers,
    queue: SyncHandle,
    shutdown: watch::Receiver<bool>,
    /// Set when the accrual system asks us to back off. No lookups are dispatched before this instant.
    paused_until: Arc<Mutex<Option<Instant>>>,
}

impl<B: Clone, P: Clone> Clone for WorkerContext<B, P> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            provider: self.provider.clone(),
            config: self.config.clone(),
            producers: self.producers.clone(),
            queue: self.queue.clone(),
            shutdown: self.shutdown.clone(),
            paused_until: Arc::clone(&self.paused_until),
        }
    }
}

impl<B, P> AccrualSyncCoordinator<B, P>
where
    B: OrderManagement + Clone + Send + Sync + 'static,
    P: AccrualProvider + Clone + Send + Sync + 'static,
{
    pub fn new(db: B, provider: P, config: SyncConfig, producers: EventProducers) -> Self {
        let (queue, receiver) = SyncHandle::new();
        Self { db, provider, config, producers, queue, receiver }
    }

    /// A handle for submitting orders. Orders can be submitted before the coordinator is started.
    pub fn handle(&self) -> SyncHandle {
        self.queue.clone()
    }

    /// Spawns the dispatcher. It first re-submits every unsettled order in the database, then runs until
    /// [`CoordinatorHandle::shutdown`] is called.
    pub fn start(self) -> CoordinatorHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let queue = self.queue.clone();
        let task = tokio::spawn(self.run(shutdown_rx));
        CoordinatorHandle { queue, shutdown, task }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let Self { db, provider, config, producers, queue, mut receiver } = self;
        info!(
            "🔄️ Accrual sync started. {} workers, dispatch interval {}ms",
            config.max_workers,
            config.dispatch_interval.as_millis()
        );
        let ctx = WorkerContext {
            db,
            provider,
            config,
            producers,
            queue,
            shutdown: shutdown.clone(),
            paused_until: Arc::new(Mutex::new(None)),
        };
        resubmit_unsettled_orders(&ctx.db, &ctx.queue).await;
        let slots = Arc::new(Semaphore::new(ctx.config.max_workers.max(1)));
        let mut workers = JoinSet::new();
        let throttle = ctx.config.dispatch_interval;
        let mut rescan = rescan_timer(ctx.config.rescan_interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = tick(&mut rescan) => {
                    debug!("🔄️ Rescanning for unsettled orders");
                    resubmit_unsettled_orders(&ctx.db, &ctx.queue).await;
                },
                Some(result) = workers.join_next(), if !workers.is_empty() => log_worker_result(result),
                job = receiver.recv() => {
                    let Some(job) = job else { break };
                    let Some(permit) = dispatch_gate(&ctx, &slots, &mut shutdown).await else {
                        ctx.queue.untrack(&job.order_number);
                        break;
                    };
                    trace!("🔄️ Dispatching lookup for order {} (attempt {})", job.order_number, job.attempt + 1);
                    workers.spawn(process_order(ctx.clone(), job, permit));
                    if !throttle.is_zero() {
                        tokio::select! {
                            biased;
                            _ = shutdown.changed() => break,
                            _ = tokio::time::sleep(throttle) => {},
                        }
                    }
                },
            }
        }
        info!("🔄️ Accrual sync is stopping. Waiting for {} in-flight workers", workers.len());
        while let Some(result) = workers.join_next().await {
            log_worker_result(result);
        }
        info!("🔄️ Accrual sync has stopped");
    }
}

/// Waits for the rate limit pause to lapse and for a free worker slot. Returns `None` on shutdown.
async fn dispatch_gate<B, P>(
    ctx: &WorkerContext<B, P>,
    slots: &Arc<Semaphore>,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<OwnedSemaphorePermit> {
    let paused_until = ctx.paused_until.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(until) = paused_until.filter(|t| *t > Instant::now()) {
        debug!("🔄️ Dispatching is paused for {}ms", until.duration_since(Instant::now()).as_millis());
        tokio::select! {
            biased;
            _ = shutdown.changed() => return None,
            _ = tokio::time::sleep_until(until) => {},
        }
    }
    tokio::select! {
        biased;
        _ = shutdown.changed() => None,
        permit = Arc::clone(slots).acquire_owned() => permit.ok(),
    }
}

fn rescan_timer(period: Option<Duration>) -> Option<Interval> {
    let period = period.filter(|p| !p.is_zero())?;
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(timer)
}

/// Ticks the timer, or never completes if there is no timer.
async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(t) => {
            t.tick().await;
        },
        None => std::future::pending::<()>().await,
    }
}

fn log_worker_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!("🔄️ Accrual sync worker failed: {e}");
    }
}

async fn resubmit_unsettled_orders<B: OrderManagement>(db: &B, queue: &SyncHandle) -> usize {
    match db.fetch_unsettled_orders().await {
        Ok(orders) => {
            let submitted = orders.iter().filter(|o| queue.submit(&o.order_number)).count();
            info!("🔄️ {} unsettled orders found. {submitted} were added to the accrual queue", orders.len());
            submitted
        },
        Err(e) => {
            error!("🔄️ Could not load unsettled orders: {e}");
            0
        },
    }
}

/// Looks the order up with the accrual system and applies the result. The worker slot is held until the job has
/// been re-queued or dropped.
async fn process_order<B, P>(mut ctx: WorkerContext<B, P>, job: SyncJob, _permit: OwnedSemaphorePermit)
where
    B: OrderManagement + Send + Sync,
    P: AccrualProvider + Send + Sync,
{
    let number = job.order_number.clone();
    let lookup = tokio::select! {
        biased;
        _ = ctx.shutdown.changed() => {
            debug!("🔄️ Abandoning accrual lookup for order {number}");
            ctx.queue.untrack(&number);
            return;
        },
        lookup = ctx.provider.lookup(&number) => lookup,
    };
    match lookup {
        Ok(AccrualLookup::Known(response)) if response.accrual.is_some_and(|a| a.is_negative()) => {
            let accrual = response.accrual.unwrap_or_default();
            give_up(&ctx, job, format!("The accrual system reported a negative accrual ({accrual})"));
        },
        Ok(AccrualLookup::Known(response)) => {
            let update = AccrualUpdate {
                order_number: number.clone(),
                status: response.status.into(),
                accrual: response.accrual,
            };
            apply_update(&ctx, job, update).await;
        },
        Ok(AccrualLookup::NotYetKnown) => {
            debug!("🔄️ Order {number} is not known to the accrual system yet. Asking again later");
            let delay = ctx.config.unknown_order_delay;
            ctx.queue.requeue_after(job.with_attempt(0), delay, ctx.shutdown.clone());
        },
        Err(AccrualApiError::RateLimited { retry_after }) => {
            warn!("🔄️ Rate limited while looking up order {number}. Pausing for {}s", retry_after.as_secs());
            let until = Instant::now() + retry_after;
            {
                let mut paused = ctx.paused_until.lock().unwrap_or_else(PoisonError::into_inner);
                *paused = Some(paused.map_or(until, |t| t.max(until)));
            }
            let event = SyncErrorEvent::new(number.clone(), job.attempt, format!("Rate limited for {retry_after:?}"));
            ctx.producers.publish_sync_error(event);
            ctx.queue.requeue_after(job, retry_after, ctx.shutdown.clone());
        },
        Err(e) if !e.is_retryable() => give_up(&ctx, job, e.to_string()),
        Err(e) => retry_later(&ctx, job, e.to_string()),
    }
}

async fn apply_update<B, P>(ctx: &WorkerContext<B, P>, job: SyncJob, update: AccrualUpdate)
where B: OrderManagement {
    let number = update.order_number.clone();
    match ctx.db.apply_accrual_result(update).await {
        Ok(AccrualApplyResult::Applied { order, credited }) => {
            let status = order.status;
            ctx.producers.publish_accrual_applied(AccrualAppliedEvent::new(order, credited));
            if status.is_terminal() {
                info!("🔄️ Order {number} settled as {status}");
                ctx.queue.untrack(&number);
            } else {
                debug!("🔄️ Order {number} is {status}. Polling again later");
                ctx.queue.requeue_after(job.with_attempt(0), ctx.config.poll_delay, ctx.shutdown.clone());
            }
        },
        Ok(AccrualApplyResult::AlreadySettled(order)) => {
            debug!("🔄️ Order {number} was already settled as {}", order.status);
            ctx.queue.untrack(&number);
        },
        Err(OrderManagementError::OrderNotFound(_)) => {
            error!("🔄️ Order {number} has disappeared from the database. It will not be tracked any further");
            let event = SyncErrorEvent::new(number.clone(), job.attempt + 1, "Order not found".to_string());
            ctx.producers.publish_sync_error(event);
            ctx.queue.untrack(&number);
        },
        Err(e) => retry_later(ctx, job, e.to_string()),
    }
}

fn retry_later<B, P>(ctx: &WorkerContext<B, P>, job: SyncJob, error: String) {
    let failures = job.attempt + 1;
    let number = job.order_number.clone();
    ctx.producers.publish_sync_error(SyncErrorEvent::new(number.clone(), failures, error.clone()));
    let policy = &ctx.config.retry;
    if policy.should_retry(failures) {
        let delay = policy.delay_for_attempt(job.attempt);
        debug!("🔄️ Accrual sync for order {number} failed ({error}). Retrying in {}ms", delay.as_millis());
        ctx.queue.requeue_after(job.with_attempt(failures), delay, ctx.shutdown.clone());
    } else {
        warn!(
            "🔄️ Accrual sync for order {number} failed {failures} times in a row ({error}). Giving up until the next \
             rescan"
        );
        ctx.queue.untrack(&number);
    }
}

/// Reports a response that no amount of retrying will fix. The order is left for the next rescan.
fn give_up<B, P>(ctx: &WorkerContext<B, P>, job: SyncJob, error: String) {
    let number = job.order_number;
    error!("🔄️ Unusable answer from the accrual system for order {number}. {error}");
    ctx.producers.publish_sync_error(SyncErrorEvent::new(number.clone(), job.attempt + 1, error));
    ctx.queue.untrack(&number);
}
