use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize the service. {0}")]
    InitializeError(String),
    #[error("Could not bring the database schema up to date. {0}")]
    MigrationError(String),
    #[error("Invalid service configuration. {0}")]
    ConfigurationError(String),
    #[error("The accrual sync coordinator did not stop within {0:?}")]
    ShutdownTimeout(Duration),
    #[error("The accrual sync coordinator stopped unexpectedly. {0}")]
    CoordinatorFailed(String),
}
