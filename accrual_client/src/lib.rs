//! # Accrual provider client
//!
//! A thin client for the external accrual system. The only query the loyalty engine needs is a lookup by order
//! number, which returns the provider's current view of the order (status and reward), or nothing at all if the
//! provider has not registered the order yet.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::AccrualApi;
pub use config::AccrualConfig;
pub use data_objects::{AccrualLookup, AccrualResponse, AccrualStatus, StatusConversionError};
pub use error::AccrualApiError;
