//! Unified error types for wallet-guard
//!
//! Transport, parse and configuration failures flow through `SignerError`.
//! Verification faults of a signing round live in `tx::selective`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for node and codec operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl SignerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_transaction(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTransaction, msg)
    }

    pub fn network_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Error object returned by the node itself (`{"code": .., "message": ..}`)
    pub fn rpc(code: i64, msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcError, msg).with_details(format!("rpc code {}", code))
    }
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for SignerError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidAddress,
    InvalidTransaction,

    // Network errors
    NetworkError,
    AuthError,
    Timeout,

    // Node errors
    RpcError,

    // Parse errors
    ParseError,
    HexError,

    // Setup
    ConfigError,
    Internal,
}

/// Result type alias for node and codec operations
pub type SignerResult<T> = Result<T, SignerError>;

// Conversions from common error types

impl From<hex::FromHexError> for SignerError {
    fn from(e: hex::FromHexError) -> Self {
        SignerError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<reqwest::Error> for SignerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SignerError::new(ErrorCode::Timeout, "Request timed out")
        } else if e.is_connect() {
            SignerError::new(ErrorCode::NetworkError, "Connection failed")
        } else if e.status().map(|s| s.as_u16()) == Some(401) {
            SignerError::new(ErrorCode::AuthError, "Node rejected RPC credentials")
        } else {
            SignerError::new(ErrorCode::NetworkError, e.to_string())
        }
    }
}

impl From<bitcoin::consensus::encode::Error> for SignerError {
    fn from(e: bitcoin::consensus::encode::Error) -> Self {
        SignerError::new(ErrorCode::InvalidTransaction, format!("Invalid transaction: {}", e))
    }
}

impl From<bitcoin::address::ParseError> for SignerError {
    fn from(e: bitcoin::address::ParseError) -> Self {
        SignerError::new(ErrorCode::InvalidAddress, format!("Invalid address: {}", e))
    }
}
