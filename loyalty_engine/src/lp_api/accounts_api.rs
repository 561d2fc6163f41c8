//! Unifies API for accessing accounts.

use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{Order, UserAccount, Withdrawal},
    lp_api::account_objects::BalanceSummary,
    traits::{AccountApiError, AccountManagement, OrderManagement, WithdrawalLedger},
};

/// The `AccountApi` provides a unified API for accessing user accounts, and the orders and withdrawals that belong to
/// them.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a new user account. The password hash is produced by the authentication layer and stored as-is.
    pub async fn create_user(&self, login: &str, password_hash: &str) -> Result<UserAccount, AccountApiError> {
        self.db.create_user(login, password_hash).await
    }

    /// Fetches the user account for the given id. If no account exists, `None` is returned.
    pub async fn account_by_id(&self, user_id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        self.db.fetch_user(user_id).await
    }

    pub async fn account_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError> {
        self.db.fetch_user_by_login(login).await
    }

    /// The user's current balance and withdrawn total. Returns `None` if the user does not exist.
    pub async fn balance(&self, user_id: i64) -> Result<Option<BalanceSummary>, AccountApiError> {
        let account = self.db.fetch_user(user_id).await?;
        Ok(account.as_ref().map(BalanceSummary::from))
    }
}

impl<B> AccountApi<B>
where B: AccountManagement + OrderManagement
{
    /// The user's orders, oldest first.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, AccountApiError> {
        trace!("🧑️ Fetching orders for user #{user_id}");
        self.db.fetch_orders_for_user(user_id).await.map_err(|e| AccountApiError::DatabaseError(e.to_string()))
    }
}

impl<B> AccountApi<B>
where B: AccountManagement + WithdrawalLedger
{
    /// The user's withdrawals, newest first.
    pub async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        trace!("🧑️ Fetching withdrawals for user #{user_id}");
        self.db.fetch_withdrawals(user_id).await.map_err(|e| AccountApiError::DatabaseError(e.to_string()))
    }
}
