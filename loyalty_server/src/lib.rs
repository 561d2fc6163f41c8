//! # Loyalty service
//! This crate hosts the loyalty points service process. It is responsible for:
//! * Reading the configuration from the environment.
//! * Opening the database and bringing the schema up to date.
//! * Running the accrual sync coordinator against the configured accrual system, and logging what it reports.
//! * Shutting everything down cleanly on Ctrl-C.
//!
//! ## Configuration
//! The service is configured via environment variables. See [config](config/index.html) for more information.
pub mod cli;
pub mod config;
pub mod errors;
pub mod service;
