use std::future::Future;

use accrual_client::{AccrualApi, AccrualApiError, AccrualLookup};

use crate::db_types::OrderNumber;

/// Looks up an order's current status with the accrual system.
///
/// Errors are treated as transient by the accrual sync coordinator, and the lookup is retried later.
pub trait AccrualProvider {
    fn lookup(
        &self,
        order_number: &OrderNumber,
    ) -> impl Future<Output = Result<AccrualLookup, AccrualApiError>> + Send;
}

impl AccrualProvider for AccrualApi {
    async fn lookup(&self, order_number: &OrderNumber) -> Result<AccrualLookup, AccrualApiError> {
        self.fetch_order(order_number.as_str()).await
    }
}
