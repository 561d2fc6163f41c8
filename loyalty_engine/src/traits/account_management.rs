use thiserror::Error;

use crate::db_types::UserAccount;

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// The `AccountManagement` trait defines behaviour for creating and querying user accounts.
///
/// Balances are never changed through this trait. See [`crate::traits::OrderManagement::apply_accrual_result`] and
/// [`crate::traits::WithdrawalLedger::withdraw`].
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Creates a new user with a zero balance. `password_hash` is stored as-is.
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<UserAccount, AccountApiError>;

    /// Fetches the user account with the given id. If no account exists, `None` is returned.
    async fn fetch_user(&self, user_id: i64) -> Result<Option<UserAccount>, AccountApiError>;

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError>;
}
