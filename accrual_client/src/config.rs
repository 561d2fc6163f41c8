use std::time::Duration;

use log::*;

const DEFAULT_ACCRUAL_ADDRESS: &str = "http://localhost:8080";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Scheme, host and port of the accrual system, e.g. `http://accrual.local:8080`
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_ACCRUAL_ADDRESS.to_string(), request_timeout: DEFAULT_REQUEST_TIMEOUT }
    }
}

impl AccrualConfig {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.to_string(), ..Default::default() }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("LPS_ACCRUAL_ADDRESS")
            .or_else(|_| std::env::var("ACCRUAL_SYSTEM_ADDRESS"))
            .unwrap_or_else(|_| {
                warn!("LPS_ACCRUAL_ADDRESS not set, using {DEFAULT_ACCRUAL_ADDRESS} as default");
                DEFAULT_ACCRUAL_ADDRESS.to_string()
            });
        let request_timeout = std::env::var("LPS_ACCRUAL_TIMEOUT_MS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid value for LPS_ACCRUAL_TIMEOUT_MS ({s}). {e}"))
                    .ok()
            })
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        Self { base_url, request_timeout }
    }
}
