use lp_common::Points;
use thiserror::Error;

use crate::db_types::Withdrawal;

#[derive(Debug, Clone, Error)]
pub enum WithdrawalError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Withdrawal amounts must be positive. Got {0}")]
    InvalidAmount(Points),
    #[error("Insufficient funds. Balance is {balance}, but {requested} was requested")]
    InsufficientFunds { balance: Points, requested: Points },
    #[error("User account #{0} does not exist")]
    AccountNotFound(i64),
}

impl From<sqlx::Error> for WithdrawalError {
    fn from(e: sqlx::Error) -> Self {
        WithdrawalError::DatabaseError(e.to_string())
    }
}

/// The `WithdrawalLedger` trait defines how points leave a user's account.
#[allow(async_fn_in_trait)]
pub trait WithdrawalLedger {
    /// Debits `amount` from the user's balance, adds it to the user's withdrawn total and records the withdrawal
    /// against `order_number`, all in one transaction.
    ///
    /// The balance can never go negative. Concurrent withdrawals for the same user are serialized, so they can not
    /// jointly spend more than the balance. On any error, nothing is written.
    async fn withdraw(&self, user_id: i64, order_number: &str, amount: Points) -> Result<Withdrawal, WithdrawalError>;

    /// The user's withdrawals, newest first.
    async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, WithdrawalError>;
}
