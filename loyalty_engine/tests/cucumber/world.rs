use std::{collections::HashMap, fmt::Debug, time::Duration};

use ::cucumber::World;
use log::*;
use loyalty_engine::{
    accrual_sync::{AccrualSyncCoordinator, CoordinatorHandle, RetryPolicy, SyncConfig},
    events::EventProducers,
    AccountApi,
    OrderFlowApi,
    SqliteDatabase,
    WithdrawalApi,
    WithdrawalError,
};

use crate::support::{
    mock_provider::ScriptedProvider,
    prepare_env::{prepare_test_env, random_db_path},
};

#[derive(Default, Debug, World)]
pub struct LoyaltyWorld {
    pub system: Option<LoyaltySystem>,
}

pub struct LoyaltySystem {
    pub db: SqliteDatabase,
    pub provider: ScriptedProvider,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub accounts: AccountApi<SqliteDatabase>,
    pub withdrawals: WithdrawalApi<SqliteDatabase>,
    pub users: HashMap<String, i64>,
    pub last_withdrawal_error: Option<WithdrawalError>,
    coordinator: Option<AccrualSyncCoordinator<SqliteDatabase, ScriptedProvider>>,
    running: Option<CoordinatorHandle>,
}

impl Debug for LoyaltySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoyaltySystem ({:?}, {} users)", self.db, self.users.len())
    }
}

impl LoyaltyWorld {
    pub async fn system(&mut self) -> &mut LoyaltySystem {
        if self.system.is_none() {
            self.system = Some(LoyaltySystem::new().await);
        }
        self.system.as_mut().expect("LoyaltySystem not initialised")
    }
}

impl LoyaltySystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        debug!("Created database: {url}");
        let provider = ScriptedProvider::new();
        let config = SyncConfig::default()
            .with_dispatch_interval(Duration::from_millis(5))
            .with_retry_policy(RetryPolicy { initial_delay: Duration::from_millis(10), ..RetryPolicy::default() })
            .with_poll_delay(Duration::from_millis(10))
            .with_unknown_order_delay(Duration::from_millis(10))
            .with_rescan_interval(None);
        let producers = EventProducers::default();
        let coordinator = AccrualSyncCoordinator::new(db.clone(), provider.clone(), config, producers.clone());
        let orders = OrderFlowApi::new(db.clone(), coordinator.handle(), producers);
        let accounts = AccountApi::new(db.clone());
        let withdrawals = WithdrawalApi::new(db.clone());
        Self {
            db,
            provider,
            orders,
            accounts,
            withdrawals,
            users: HashMap::new(),
            last_withdrawal_error: None,
            coordinator: Some(coordinator),
            running: None,
        }
    }

    pub fn user_id(&self, login: &str) -> i64 {
        *self.users.get(login).unwrap_or_else(|| panic!("Unknown user '{login}'"))
    }

    pub fn start_sync(&mut self) {
        if let Some(coordinator) = self.coordinator.take() {
            self.running = Some(coordinator.start());
        }
    }

    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.running.take() {
            match tokio::time::timeout(Duration::from_secs(5), handle.shutdown()).await {
                Ok(Ok(())) => trace!("🚀️ Accrual sync stopped"),
                Ok(Err(e)) => error!("🚀️ Accrual sync failed: {e}"),
                Err(_) => error!("🚀️ Accrual sync did not stop in time"),
            }
        }
    }
}
