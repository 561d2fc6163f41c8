use std::future::Future;

use thiserror::Error;

use crate::{
    db_types::{Order, OrderNumber},
    traits::data_objects::{AccrualApplyResult, AccrualUpdate, InsertOrderResult},
};

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("User account #{0} does not exist")]
    UserNotFound(i64),
}

impl From<sqlx::Error> for OrderManagementError {
    fn from(e: sqlx::Error) -> Self {
        OrderManagementError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines the storage behaviour for orders and their accrual lifecycle.
///
/// The returned futures are `Send`, so that backends can be driven from spawned tasks (the accrual sync workers).
pub trait OrderManagement {
    /// Registers `order_number` for the given user, unless the number is already known.
    ///
    /// New orders start out as `REGISTERED`. Registering the same number twice for the same user is not an error, and
    /// returns the stored order. If the number belongs to a different user, nothing is changed and
    /// [`InsertOrderResult::OwnedByAnotherUser`] is returned.
    fn insert_order(
        &self,
        user_id: i64,
        order_number: &OrderNumber,
    ) -> impl Future<Output = Result<InsertOrderResult, OrderManagementError>> + Send;

    fn fetch_order(
        &self,
        order_number: &OrderNumber,
    ) -> impl Future<Output = Result<Option<Order>, OrderManagementError>> + Send;

    /// All orders belonging to the user, oldest first.
    fn fetch_orders_for_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<Order>, OrderManagementError>> + Send;

    /// All orders whose status is not terminal, i.e. every order the accrual system still has to decide on.
    fn fetch_unsettled_orders(&self) -> impl Future<Output = Result<Vec<Order>, OrderManagementError>> + Send;

    /// Applies an accrual outcome in a single atomic transaction.
    ///
    /// The order status (and accrual) are updated unless the stored order is already in a terminal state, in which
    /// case [`AccrualApplyResult::AlreadySettled`] is returned and nothing changes. If the new status is `PROCESSED`
    /// and the accrual is positive, the owner's balance is credited in the same transaction.
    fn apply_accrual_result(
        &self,
        update: AccrualUpdate,
    ) -> impl Future<Output = Result<AccrualApplyResult, OrderManagementError>> + Send;
}
