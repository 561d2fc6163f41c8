#![allow(dead_code)]
pub mod mock_provider;
pub mod prepare_env;
