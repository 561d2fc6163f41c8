use accrual_client::AccrualResponse;
use lp_common::Points;

use crate::db_types::{Order, OrderNumber, OrderStatusType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    /// The order is new and now belongs to the user.
    Inserted(Order),
    /// The user has already registered this order. Nothing was changed.
    AlreadyRegistered(Order),
    /// The order number belongs to a different user. Nothing was changed.
    OwnedByAnotherUser,
}

/// An outcome reported by the accrual system for a single order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualUpdate {
    pub order_number: OrderNumber,
    pub status: OrderStatusType,
    pub accrual: Option<Points>,
}

impl AccrualUpdate {
    pub fn new(order_number: OrderNumber, status: OrderStatusType) -> Self {
        Self { order_number, status, accrual: None }
    }

    pub fn with_accrual(mut self, accrual: Points) -> Self {
        self.accrual = Some(accrual);
        self
    }

    /// The amount to add to the owner's balance. Only positive `PROCESSED` accruals are credited.
    pub fn credit(&self) -> Option<Points> {
        match (self.status, self.accrual) {
            (OrderStatusType::Processed, Some(amount)) if amount.is_positive() => Some(amount),
            _ => None,
        }
    }
}

impl From<AccrualResponse> for AccrualUpdate {
    fn from(resp: AccrualResponse) -> Self {
        Self { order_number: OrderNumber(resp.order), status: resp.status.into(), accrual: resp.accrual }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualApplyResult {
    /// The order was updated. `credited` is the amount added to the owner's balance, if any.
    Applied { order: Order, credited: Option<Points> },
    /// The order had already reached a terminal status. Nothing was changed.
    AlreadySettled(Order),
}

impl AccrualApplyResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Applied { order, .. } => order,
            Self::AlreadySettled(order) => order,
        }
    }
}
