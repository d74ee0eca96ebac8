//! Utilities Module
//!
//! Logging and node connection settings used across the crate.

pub mod logging;
pub mod network_config;

pub use network_config::{EndpointValidation, RpcConfig};
