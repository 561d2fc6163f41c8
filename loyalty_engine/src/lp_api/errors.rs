use thiserror::Error;

use crate::{db_types::OrderNumber, traits::OrderManagementError};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} has already been registered by another user")]
    OrderOwnedByAnotherUser(OrderNumber),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("User account #{0} does not exist")]
    UserNotFound(i64),
}

impl From<OrderManagementError> for OrderFlowError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::DatabaseError(s) => Self::DatabaseError(s),
            OrderManagementError::OrderNotFound(n) => Self::OrderNotFound(n),
            OrderManagementError::UserNotFound(id) => Self::UserNotFound(id),
        }
    }
}
