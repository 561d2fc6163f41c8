use chrono::{DateTime, Utc};
use lp_common::Points;
use serde::Serialize;

use crate::db_types::{Order, OrderNumber};

/// Emitted after an accrual result has been written to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccrualAppliedEvent {
    pub order: Order,
    /// The amount credited to the owner's balance, if any.
    pub credited: Option<Points>,
}

impl AccrualAppliedEvent {
    pub fn new(order: Order, credited: Option<Points>) -> Self {
        Self { order, credited }
    }
}

/// Emitted by the accrual sync coordinator when a lookup or an update fails. These are reported for observability
/// only. The coordinator retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncErrorEvent {
    pub order_number: OrderNumber,
    /// The number of consecutive failures for this order, including this one.
    pub attempt: u32,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl SyncErrorEvent {
    pub fn new(order_number: OrderNumber, attempt: u32, error: String) -> Self {
        Self { order_number, attempt, error, timestamp: Utc::now() }
    }
}
