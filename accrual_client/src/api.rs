use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};

use crate::{
    config::AccrualConfig,
    data_objects::{AccrualLookup, AccrualResponse},
    AccrualApiError,
};

/// Used when the accrual system rate-limits us without saying for how long.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AccrualApi {
    config: AccrualConfig,
    client: Arc<Client>,
}

impl AccrualApi {
    pub fn new(config: AccrualConfig) -> Result<Self, AccrualApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AccrualApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &AccrualConfig {
        &self.config
    }

    pub fn url(&self, order_number: &str) -> String {
        format!("{}/api/orders/{order_number}", self.config.base_url.trim_end_matches('/'))
    }

    /// Asks the accrual system for its current view of the given order.
    ///
    /// * `200 OK` carries an [`AccrualResponse`].
    /// * `204 No Content` means the order has not been registered with the accrual system.
    /// * `429 Too Many Requests` is mapped to [`AccrualApiError::RateLimited`], honouring `Retry-After` when present.
    ///
    /// Any other response is an error.
    pub async fn fetch_order(&self, order_number: &str) -> Result<AccrualLookup, AccrualApiError> {
        let url = self.url(order_number);
        trace!("Querying accrual system: {url}");
        let response =
            self.client.get(url).send().await.map_err(|e| AccrualApiError::RequestError(e.to_string()))?;
        match response.status() {
            StatusCode::OK => {
                let body = response
                    .json::<AccrualResponse>()
                    .await
                    .map_err(|e| AccrualApiError::JsonError(e.to_string()))?;
                debug!("Accrual system reports order {order_number} as {}", body.status);
                Ok(AccrualLookup::Known(body))
            },
            StatusCode::NO_CONTENT => {
                debug!("Accrual system does not know about order {order_number} yet");
                Ok(AccrualLookup::NotYetKnown)
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let header = response.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok());
                let retry_after = parse_retry_after(header);
                warn!("Accrual system is rate limiting us. Backing off for {}s", retry_after.as_secs());
                Err(AccrualApiError::RateLimited { retry_after })
            },
            status => {
                let status = status.as_u16();
                let message =
                    response.text().await.map_err(|e| AccrualApiError::RequestError(e.to_string()))?;
                Err(AccrualApiError::QueryError { status, message })
            },
        }
    }
}

/// Reads a `Retry-After` header given in whole seconds.
pub(crate) fn parse_retry_after(value: Option<&str>) -> Duration {
    value.and_then(|s| s.trim().parse::<u64>().ok()).map(Duration::from_secs).unwrap_or(DEFAULT_RETRY_AFTER)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn retry_after_header() {
        assert_eq!(parse_retry_after(Some("5")), Duration::from_secs(5));
        assert_eq!(parse_retry_after(Some(" 120 ")), Duration::from_secs(120));
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT")), DEFAULT_RETRY_AFTER);
        assert_eq!(parse_retry_after(None), DEFAULT_RETRY_AFTER);
    }

    #[test]
    fn order_url() {
        let api = AccrualApi::new(AccrualConfig::new("http://accrual.local:8080/")).unwrap();
        assert_eq!(api.url("12345678903"), "http://accrual.local:8080/api/orders/12345678903");
    }
}
