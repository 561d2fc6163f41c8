use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AccrualApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request to the accrual system failed: {0}")]
    RequestError(String),
    #[error("The accrual system is rate limiting requests. Retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
}

impl AccrualApiError {
    /// A malformed answer will be malformed again on the next attempt. Everything else may clear up.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::JsonError(_) | Self::Initialization(_))
    }
}
