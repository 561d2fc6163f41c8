//! `SqliteDatabase` is a concrete implementation of a loyalty engine backend.
//!
//! It uses SQLite and implements all the storage traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use lp_common::Points;
use sqlx::{error::ErrorKind, SqlitePool};

use super::db::{new_pool, orders, run_migrations, user_accounts, withdrawals};
use crate::{
    db_types::{Order, OrderNumber, OrderStatusType, UserAccount, Withdrawal},
    traits::{
        AccountApiError,
        AccountManagement,
        AccrualApplyResult,
        AccrualUpdate,
        InsertOrderResult,
        OrderManagement,
        OrderManagementError,
        WithdrawalError,
        WithdrawalLedger,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

fn is_error_kind(e: &sqlx::Error, kind: ErrorKind) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.kind() == kind)
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(
        &self,
        user_id: i64,
        order_number: &OrderNumber,
    ) -> Result<InsertOrderResult, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let inserted = orders::insert_order(user_id, order_number, &mut tx).await.map_err(|e| {
            if is_error_kind(&e, ErrorKind::ForeignKeyViolation) {
                OrderManagementError::UserNotFound(user_id)
            } else {
                OrderManagementError::from(e)
            }
        })?;
        let result = match inserted {
            Some(order) => InsertOrderResult::Inserted(order),
            None => {
                let existing = orders::fetch_order_by_number(order_number, &mut tx)
                    .await?
                    .ok_or_else(|| OrderManagementError::OrderNotFound(order_number.clone()))?;
                if existing.user_id == user_id {
                    debug!("🗃️ Order {order_number} was already registered by user #{user_id}");
                    InsertOrderResult::AlreadyRegistered(existing)
                } else {
                    debug!(
                        "🗃️ User #{user_id} tried to register order {order_number}, which belongs to user #{}",
                        existing.user_id
                    );
                    InsertOrderResult::OwnedByAnotherUser
                }
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_unsettled_orders(&self) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let statuses = [OrderStatusType::Registered, OrderStatusType::Processing];
        let orders = orders::fetch_orders_by_status(&statuses, &mut conn).await?;
        Ok(orders)
    }

    /// Takes an accrual outcome and, in a single atomic transaction,
    /// * updates the order status, guarded on the order not being in a terminal state yet,
    /// * credits the owner's balance if the order is now `PROCESSED` with a positive accrual.
    ///
    /// If the guard fails, the transaction is rolled back and the stored order is returned as `AlreadySettled`.
    async fn apply_accrual_result(&self, update: AccrualUpdate) -> Result<AccrualApplyResult, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let number = update.order_number.clone();
        let Some(order) = orders::update_unsettled_order(&update, &mut tx).await? else {
            let existing = orders::fetch_order_by_number(&number, &mut tx)
                .await?
                .ok_or_else(|| OrderManagementError::OrderNotFound(number.clone()))?;
            tx.rollback().await?;
            debug!("🗃️ Order {number} is already {}. Accrual result ignored", existing.status);
            return Ok(AccrualApplyResult::AlreadySettled(existing));
        };
        let credited = update.credit();
        if let Some(amount) = credited {
            let credited_user = user_accounts::credit_balance(order.user_id, amount, &mut tx).await?;
            if !credited_user {
                // Rolls back the status update too
                return Err(OrderManagementError::UserNotFound(order.user_id));
            }
            debug!("🗃️ Credited {amount} to user #{} for order {number}", order.user_id);
        }
        tx.commit().await?;
        debug!("🗃️ Order {number} is now {}", order.status);
        Ok(AccrualApplyResult::Applied { order, credited })
    }
}

impl AccountManagement for SqliteDatabase {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<UserAccount, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        user_accounts::insert_user(login, password_hash, &mut conn).await.map_err(|e| {
            if is_error_kind(&e, ErrorKind::UniqueViolation) {
                AccountApiError::LoginTaken(login.to_string())
            } else {
                AccountApiError::from(e)
            }
        })
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let account = user_accounts::user_account_by_id(user_id, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let account = user_accounts::user_account_by_login(login, &mut conn).await?;
        Ok(account)
    }
}

impl WithdrawalLedger for SqliteDatabase {
    /// The conditional debit is the first statement, so the transaction holds the write lock before anything is
    /// read. If the debit does not match a row, the user is read (still under the lock) to tell an overdraft apart
    /// from a missing account, and nothing is written.
    async fn withdraw(&self, user_id: i64, order_number: &str, amount: Points) -> Result<Withdrawal, WithdrawalError> {
        if !amount.is_positive() {
            return Err(WithdrawalError::InvalidAmount(amount));
        }
        let mut tx = self.pool.begin().await?;
        if !user_accounts::debit_balance(user_id, amount, &mut tx).await? {
            let account = user_accounts::user_account_by_id(user_id, &mut tx).await?;
            tx.rollback().await?;
            return match account {
                Some(acc) => {
                    debug!("🗃️ User #{user_id} cannot withdraw {amount}. Balance is {}", acc.balance);
                    Err(WithdrawalError::InsufficientFunds { balance: acc.balance, requested: amount })
                },
                None => Err(WithdrawalError::AccountNotFound(user_id)),
            };
        }
        let withdrawal = withdrawals::insert_withdrawal(user_id, order_number, amount, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ User #{user_id} withdrew {amount} for order {order_number}");
        Ok(withdrawal)
    }

    async fn fetch_withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, WithdrawalError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await?;
        Ok(withdrawals)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        run_migrations(&self.pool).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
