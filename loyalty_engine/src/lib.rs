//! Loyalty Engine
//!
//! The loyalty engine holds the core logic of the loyalty points service. Users register orders, an external accrual
//! system works out how many points each order earns, and the points are credited to the user's balance. Users can
//! later spend (withdraw) points against their balance.
//!
//! The library is divided into the following sections:
//! 1. Storage. The [`traits`] module defines the contracts a storage backend has to honour. [`SqliteDatabase`] is the
//!    only backend at the moment. All balance-changing operations are single, all-or-nothing transactions.
//! 2. The public API (`lp_api`): [`OrderFlowApi`], [`AccountApi`] and [`WithdrawalApi`]. Front ends should use these
//!    rather than calling the storage backend directly.
//! 3. Accrual synchronization ([`accrual_sync`]). A background coordinator that polls the accrual system for every
//!    order that has not reached a final status, and applies the results.
//!
//! The engine also emits events (see [`events`]) when accruals are applied or when synchronization fails, so that
//! other components can hook into them.
pub mod accrual_sync;
pub mod db_types;
pub mod events;
mod lp_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use lp_api::{
    account_objects,
    accounts_api::AccountApi,
    errors::OrderFlowError,
    order_flow_api::OrderFlowApi,
    order_objects,
    withdrawal_api::WithdrawalApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AccountApiError,
    AccountManagement,
    AccrualApplyResult,
    AccrualProvider,
    AccrualUpdate,
    InsertOrderResult,
    OrderManagement,
    OrderManagementError,
    WithdrawalError,
    WithdrawalLedger,
};
