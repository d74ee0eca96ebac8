//! Node RPC Module
//!
//! Thin typed wrapper over a Bitcoin Core wallet endpoint. The client is
//! also the production `TransactionSigner` behind selective signing.

mod client;

pub use client::*;
