use std::fmt::Debug;

use log::*;

use crate::{
    accrual_sync::SyncHandle,
    db_types::{Order, OrderNumber},
    events::{AccrualAppliedEvent, EventProducers},
    lp_api::{errors::OrderFlowError, order_objects::OrderRegistration},
    traits::{AccrualApplyResult, AccrualUpdate, InsertOrderResult, OrderManagement},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: users registering orders, and accrual outcomes being
/// written back to them.
pub struct OrderFlowApi<B> {
    db: B,
    sync: SyncHandle,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, sync: SyncHandle, producers: EventProducers) -> Self {
        Self { db, sync, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Registers an order for the user and queues it for an accrual lookup.
    ///
    /// Registering the same order twice is harmless. If the order is not settled yet, it is queued again in case it had
    /// dropped out of the sync queue. An order belonging to a different user is rejected with
    /// [`OrderFlowError::OrderOwnedByAnotherUser`].
    pub async fn register_order(
        &self,
        user_id: i64,
        order_number: &OrderNumber,
    ) -> Result<OrderRegistration, OrderFlowError> {
        match self.db.insert_order(user_id, order_number).await? {
            InsertOrderResult::Inserted(order) => {
                info!("🔄️📦️ Order {order_number} registered for user #{user_id}");
                self.sync.submit(order_number);
                Ok(OrderRegistration::Accepted(order))
            },
            InsertOrderResult::AlreadyRegistered(order) => {
                if !order.status.is_terminal() {
                    self.sync.submit(order_number);
                }
                Ok(OrderRegistration::AlreadyRegistered(order))
            },
            InsertOrderResult::OwnedByAnotherUser => {
                Err(OrderFlowError::OrderOwnedByAnotherUser(order_number.clone()))
            },
        }
    }

    /// Writes an accrual outcome to the order and credits the owner for `PROCESSED` orders. See
    /// [`OrderManagement::apply_accrual_result`].
    pub async fn apply_accrual_result(&self, update: AccrualUpdate) -> Result<AccrualApplyResult, OrderFlowError> {
        let result = self.db.apply_accrual_result(update).await?;
        if let AccrualApplyResult::Applied { order, credited } = &result {
            trace!("🔄️📦️ Notifying accrual applied hook subscribers");
            self.producers.publish_accrual_applied(AccrualAppliedEvent::new(order.clone(), *credited));
        }
        Ok(result)
    }

    pub async fn order(&self, order_number: &OrderNumber) -> Result<Option<Order>, OrderFlowError> {
        let order = self.db.fetch_order(order_number).await?;
        Ok(order)
    }

    pub fn sync_handle(&self) -> &SyncHandle {
        &self.sync
    }
}
