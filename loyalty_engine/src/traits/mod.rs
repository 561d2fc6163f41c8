//! # Storage contracts
//!
//! This module defines the behaviour a storage backend has to provide to support the loyalty engine.
//!
//! * [`OrderManagement`] registers orders and applies accrual results. Applying a `PROCESSED` result credits the
//!   owner's balance in the same transaction.
//! * [`AccountManagement`] creates and queries user accounts.
//! * [`WithdrawalLedger`] debits balances and records withdrawals.
//!
//! [`AccrualProvider`] is the seam to the external accrual system. It is implemented for
//! [`accrual_client::AccrualApi`], and tests provide scripted versions of it.
mod account_management;
mod accrual_provider;
mod data_objects;
mod order_management;
mod withdrawal_ledger;

pub use account_management::{AccountApiError, AccountManagement};
pub use accrual_provider::AccrualProvider;
pub use data_objects::{AccrualApplyResult, AccrualUpdate, InsertOrderResult};
pub use order_management::{OrderManagement, OrderManagementError};
pub use withdrawal_ledger::{WithdrawalError, WithdrawalLedger};
