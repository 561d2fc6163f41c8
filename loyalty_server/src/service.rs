use std::{future::Future, pin::Pin, time::Duration};

use accrual_client::AccrualApi;
use log::*;
use loyalty_engine::{
    accrual_sync::{AccrualSyncCoordinator, CoordinatorHandle},
    events::{AccrualAppliedEvent, EventHandlers, EventHooks, EventProducers, SyncErrorEvent},
    AccountApi,
    OrderFlowApi,
    SqliteDatabase,
    WithdrawalApi,
};

use crate::{config::ServerConfig, errors::ServerError};

pub const LOGGING_EVENT_BUFFER_SIZE: usize = 50;

/// A running loyalty service: the database pool, the event sinks and the accrual sync coordinator.
pub struct LoyaltyService {
    db: SqliteDatabase,
    producers: EventProducers,
    coordinator: CoordinatorHandle,
    shutdown_grace: Duration,
}

impl LoyaltyService {
    /// Opens the database, applies migrations if configured to, and starts the accrual sync coordinator. The
    /// coordinator picks up every unsettled order in the database straight away.
    pub async fn start(config: ServerConfig) -> Result<Self, ServerError> {
        let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
            .await
            .map_err(|e| ServerError::InitializeError(e.to_string()))?;
        if config.run_migrations {
            db.migrate().await.map_err(|e| ServerError::MigrationError(e.to_string()))?;
        } else {
            info!("🚀️ Skipping database migrations");
        }
        let provider =
            AccrualApi::new(config.accrual.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
        let handlers = create_logging_event_handlers();
        let producers = handlers.producers();
        handlers.start_handlers().await;
        let coordinator = AccrualSyncCoordinator::new(db.clone(), provider, config.sync.clone(), producers.clone());
        let coordinator = coordinator.start();
        info!("🚀️ Loyalty service started. Database: {}", db.url());
        Ok(Self { db, producers, coordinator, shutdown_grace: config.shutdown_grace })
    }

    pub fn order_flow_api(&self) -> OrderFlowApi<SqliteDatabase> {
        OrderFlowApi::new(self.db.clone(), self.coordinator.sync_handle(), self.producers.clone())
    }

    pub fn accounts_api(&self) -> AccountApi<SqliteDatabase> {
        AccountApi::new(self.db.clone())
    }

    pub fn withdrawal_api(&self) -> WithdrawalApi<SqliteDatabase> {
        WithdrawalApi::new(self.db.clone())
    }

    /// Stops the coordinator, giving database updates that are under way up to the grace period to complete, and
    /// closes the connection pool.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        let Self { db, coordinator, shutdown_grace, .. } = self;
        let result = match tokio::time::timeout(shutdown_grace, coordinator.shutdown()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ServerError::CoordinatorFailed(e.to_string())),
            Err(_) => Err(ServerError::ShutdownTimeout(shutdown_grace)),
        };
        db.close().await;
        info!("🚀️ Loyalty service stopped");
        result
    }
}

/// Event sinks that write accrual and sync events to the log.
pub fn create_logging_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_accrual_applied(|ev: AccrualAppliedEvent| {
        let AccrualAppliedEvent { order, credited } = ev;
        match credited {
            Some(points) => info!(
                "📬️ Order {} is {}. {points} points credited to user #{}",
                order.order_number, order.status, order.user_id
            ),
            None => info!("📬️ Order {} is now {}", order.order_number, order.status),
        }
        no_op()
    });
    hooks.on_sync_error(|ev: SyncErrorEvent| {
        warn!(
            "📬️ Accrual sync for order {} failed (attempt {}) at {}. {}",
            ev.order_number, ev.attempt, ev.timestamp, ev.error
        );
        no_op()
    });
    EventHandlers::new(LOGGING_EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async {})
}
