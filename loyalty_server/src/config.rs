//! Service configuration.
//!
//! Everything is read from `LPS_*` environment variables. Missing or malformed values are logged and replaced with
//! their defaults, so the service always starts with a usable configuration.
use std::{env, fmt::Display, str::FromStr, time::Duration};

use accrual_client::AccrualConfig;
use log::*;
use loyalty_engine::{
    accrual_sync::{RetryPolicy, SyncConfig},
    sqlite::db::SQLITE_DB_URL,
};
use lp_common::helpers::parse_boolean_flag;

const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_ACCRUAL_ADDRESS: &str = "http://localhost:8080";
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// If true, pending schema migrations are applied on start-up.
    pub run_migrations: bool,
    pub accrual: AccrualConfig,
    pub sync: SyncConfig,
    /// How long shutdown waits for the accrual sync coordinator to finish updates that are under way.
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: SQLITE_DB_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
            accrual: AccrualConfig::new(DEFAULT_ACCRUAL_ADDRESS),
            sync: SyncConfig::default(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl ServerConfig {
    pub fn new(database_url: &str, accrual_address: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            accrual: AccrualConfig::new(accrual_address),
            ..Default::default()
        }
    }

    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key-value source. `from_env_or_default` uses the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let defaults = Self::default();
        let database_url = lookup("LPS_DATABASE_URL").or_else(|| lookup("DATABASE_URI")).unwrap_or_else(|| {
            warn!("🪛️ LPS_DATABASE_URL is not set. Using {SQLITE_DB_URL} as the default.");
            SQLITE_DB_URL.to_string()
        });
        let max_connections = parse_value(&lookup, "LPS_DB_MAX_CONNECTIONS", defaults.max_connections);
        let run_migrations = parse_boolean_flag(lookup("LPS_RUN_MIGRATIONS"), defaults.run_migrations);
        let accrual = accrual_config(&lookup, defaults.accrual);
        let sync = sync_config(&lookup, defaults.sync);
        let shutdown_grace = lookup_secs(&lookup, "LPS_SHUTDOWN_GRACE_SECS").unwrap_or(defaults.shutdown_grace);
        Self { database_url, max_connections, run_migrations, accrual, sync, shutdown_grace }
    }
}

fn accrual_config<F>(lookup: &F, defaults: AccrualConfig) -> AccrualConfig
where F: Fn(&str) -> Option<String> {
    let base_url = lookup("LPS_ACCRUAL_ADDRESS").or_else(|| lookup("ACCRUAL_SYSTEM_ADDRESS")).unwrap_or_else(|| {
        warn!("🪛️ LPS_ACCRUAL_ADDRESS is not set. Using {} as the default.", defaults.base_url);
        defaults.base_url.clone()
    });
    let timeout = lookup_millis(lookup, "LPS_ACCRUAL_TIMEOUT_MS").unwrap_or(defaults.request_timeout);
    AccrualConfig::new(&base_url).with_request_timeout(timeout)
}

fn sync_config<F>(lookup: &F, defaults: SyncConfig) -> SyncConfig
where F: Fn(&str) -> Option<String> {
    let retry = RetryPolicy {
        max_attempts: parse_value(lookup, "LPS_SYNC_MAX_ATTEMPTS", defaults.retry.max_attempts),
        initial_delay: lookup_millis(lookup, "LPS_SYNC_RETRY_DELAY_MS").unwrap_or(defaults.retry.initial_delay),
        max_delay: lookup_millis(lookup, "LPS_SYNC_MAX_RETRY_DELAY_MS").unwrap_or(defaults.retry.max_delay),
        multiplier: defaults.retry.multiplier,
    };
    if retry.max_delay < retry.initial_delay {
        warn!(
            "🪛️ LPS_SYNC_MAX_RETRY_DELAY_MS ({}ms) is shorter than LPS_SYNC_RETRY_DELAY_MS ({}ms). Every retry will \
             wait {}ms.",
            retry.max_delay.as_millis(),
            retry.initial_delay.as_millis(),
            retry.max_delay.as_millis()
        );
    }
    let max_workers = match parse_value(lookup, "LPS_SYNC_MAX_WORKERS", defaults.max_workers) {
        0 => {
            warn!("🪛️ LPS_SYNC_MAX_WORKERS cannot be zero. Using {} instead.", defaults.max_workers);
            defaults.max_workers
        },
        n => n,
    };
    let rescan_interval = match lookup_secs(lookup, "LPS_SYNC_RESCAN_INTERVAL_SECS") {
        Some(interval) => Some(interval),
        None => defaults.rescan_interval,
    };
    SyncConfig::default()
        .with_dispatch_interval(
            lookup_millis(lookup, "LPS_SYNC_DISPATCH_INTERVAL_MS").unwrap_or(defaults.dispatch_interval),
        )
        .with_max_workers(max_workers)
        .with_retry_policy(retry)
        .with_poll_delay(lookup_millis(lookup, "LPS_SYNC_POLL_DELAY_MS").unwrap_or(defaults.poll_delay))
        .with_unknown_order_delay(
            lookup_millis(lookup, "LPS_SYNC_UNKNOWN_ORDER_DELAY_MS").unwrap_or(defaults.unknown_order_delay),
        )
        .with_rescan_interval(rescan_interval)
}

fn parse_value<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    lookup_parsed(lookup, key).unwrap_or(default)
}

fn lookup_parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let value = lookup(key)?;
    value
        .trim()
        .parse::<T>()
        .map_err(|e| error!("🪛️ {value} is not a valid value for {key}. {e} Using the default instead."))
        .ok()
}

fn lookup_millis<F>(lookup: &F, key: &str) -> Option<Duration>
where F: Fn(&str) -> Option<String> {
    lookup_parsed::<F, u64>(lookup, key).map(Duration::from_millis)
}

fn lookup_secs<F>(lookup: &F, key: &str) -> Option<Duration>
where F: Fn(&str) -> Option<String> {
    lookup_parsed::<F, u64>(lookup, key).map(Duration::from_secs)
}
