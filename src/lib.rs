//! wallet-guard
//!
//! Selective single-input signing on top of a wallet that can only "sign
//! everything it can".
//!
//! # Architecture
//!
//! This crate provides:
//! - **tx**: raw transaction codec, per-input witness/script comparison,
//!   and the selective signing guard (`safe_sign`, `SigningRound`)
//! - **rpc**: blocking JSON-RPC client for a Bitcoin Core wallet, which is
//!   the production `TransactionSigner`
//! - **utils**: redacting structured logger and RPC endpoint config
//!
//! # Example
//!
//! ```rust,ignore
//! use wallet_guard::{RpcClient, RpcConfig};
//!
//! let client = RpcClient::new(RpcConfig::default().with_env_overrides()?)?;
//! let outcome = client.safe_sign_raw_transaction_with_wallet(&unsigned, 1)?;
//! println!("complete: {}", outcome.complete);
//! ```

pub mod error;
pub mod rpc;
pub mod tx;
pub mod types;
pub mod utils;

pub use error::{ErrorCode, SignerError, SignerResult};
pub use rpc::RpcClient;
pub use tx::{
    decode_transaction, diff_inputs, encode_transaction, safe_sign, verify_selective_signature,
    witness_equal, FaultKind, InputDiff, RoundState, SignOutcome, SigningFault, SigningRound,
    TransactionSigner,
};
pub use utils::RpcConfig;
