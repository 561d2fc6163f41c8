use std::fmt::Debug;

use log::*;
use lp_common::Points;

use crate::{
    db_types::Withdrawal,
    traits::{WithdrawalError, WithdrawalLedger},
};

/// Spends points from a user's balance.
pub struct WithdrawalApi<B> {
    db: B,
}

impl<B: Debug> Debug for WithdrawalApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WithdrawalApi ({:?})", self.db)
    }
}

impl<B> WithdrawalApi<B>
where B: WithdrawalLedger
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Withdraws `amount` points from the user's balance against `order_number`.
    ///
    /// [`WithdrawalError::InsufficientFunds`] is a business rule rejection, and leaves the account untouched. Any other
    /// error is an infrastructure failure.
    pub async fn withdraw(
        &self,
        user_id: i64,
        order_number: &str,
        amount: Points,
    ) -> Result<Withdrawal, WithdrawalError> {
        match self.db.withdraw(user_id, order_number, amount).await {
            Ok(withdrawal) => {
                debug!("💸️ Withdrawal #{} of {amount} recorded for user #{user_id}", withdrawal.id);
                Ok(withdrawal)
            },
            Err(e @ WithdrawalError::InsufficientFunds { .. }) => {
                info!("💸️ Withdrawal of {amount} for user #{user_id} rejected. {e}");
                Err(e)
            },
            Err(e) => {
                error!("💸️ Withdrawal of {amount} for user #{user_id} failed. {e}");
                Err(e)
            },
        }
    }

    /// The user's withdrawals, newest first.
    pub async fn withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, WithdrawalError> {
        self.db.fetch_withdrawals(user_id).await
    }
}
