//! Shared types for wallet-guard
//!
//! Typed shapes of the Bitcoin Core JSON-RPC results we consume, plus the
//! response envelope printed by the CLI. Every node response is decoded
//! into one of these structs at the boundary.

use bitcoin::{Amount, Txid};
use serde::{Deserialize, Serialize};

// =============================================================================
// JSON-RPC envelope
// =============================================================================

/// JSON-RPC 1.0 request as spoken by bitcoind
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a [serde_json::Value],
}

/// JSON-RPC response; `result` is kept raw until the caller picks a type
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

// =============================================================================
// Wallet call results
// =============================================================================

/// `signrawtransactionwithwallet`
#[derive(Debug, Clone, Deserialize)]
pub struct SignRawTransactionResult {
    pub hex: String,
    pub complete: bool,
    #[serde(default)]
    pub errors: Vec<SignRawTransactionError>,
}

/// Per-input failure reported by the wallet while signing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignRawTransactionError {
    pub txid: Txid,
    pub vout: u32,
    #[serde(rename = "scriptSig")]
    pub script_sig: String,
    pub sequence: u32,
    pub error: String,
}

/// `fundrawtransaction`
#[derive(Debug, Clone, Deserialize)]
pub struct FundRawTransactionResult {
    pub hex: String,
    #[serde(with = "bitcoin::amount::serde::as_btc")]
    pub fee: Amount,
    /// -1 when no change output was added
    pub changepos: i64,
}

/// One entry of the `testmempoolaccept` result array
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MempoolAcceptResult {
    pub txid: Txid,
    pub allowed: bool,
    #[serde(rename = "reject-reason", default)]
    pub reject_reason: Option<String>,
}

/// `getaddressinfo` (only the fields we act on)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressInfo {
    pub address: String,
    #[serde(rename = "ismine")]
    pub is_mine: bool,
}

/// One entry of `listreceivedbyaddress`
#[derive(Debug, Clone, Deserialize)]
pub struct ReceivedByAddress {
    pub address: String,
    #[serde(with = "bitcoin::amount::serde::as_btc")]
    pub amount: Amount,
    pub confirmations: u32,
    #[serde(default)]
    pub txids: Vec<Txid>,
}

/// One entry of `listunspent`
#[derive(Debug, Clone, Deserialize)]
pub struct UnspentOutput {
    pub txid: Txid,
    pub vout: u32,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: String,
    #[serde(with = "bitcoin::amount::serde::as_btc")]
    pub amount: Amount,
    pub confirmations: u32,
    pub spendable: bool,
    #[serde(default)]
    pub solvable: bool,
    #[serde(default)]
    pub safe: bool,
}

/// `gettxout` for an unspent output
#[derive(Debug, Clone, Deserialize)]
pub struct TxOutInfo {
    pub bestblock: String,
    pub confirmations: u32,
    #[serde(with = "bitcoin::amount::serde::as_btc")]
    pub value: Amount,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKeyInfo,
    pub coinbase: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptPubKeyInfo {
    pub hex: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub script_type: String,
}

// =============================================================================
// CLI output
// =============================================================================

/// Standard response envelope printed by the CLI
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":"Serialization failed"}"#.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_result_with_wallet_errors() {
        let json = r#"{
            "hex": "0200",
            "complete": false,
            "errors": [{
                "txid": "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b",
                "vout": 0,
                "scriptSig": "",
                "sequence": 4294967295,
                "error": "Input not found or already spent"
            }]
        }"#;
        let result: SignRawTransactionResult = serde_json::from_str(json).unwrap();
        assert!(!result.complete);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].sequence, u32::MAX);
    }

    #[test]
    fn test_sign_result_without_errors_field() {
        let result: SignRawTransactionResult =
            serde_json::from_str(r#"{"hex": "0200", "complete": true}"#).unwrap();
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_mempool_accept_reject_reason() {
        let json = r#"[{
            "txid": "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b",
            "allowed": false,
            "reject-reason": "missing-inputs"
        }]"#;
        let result: Vec<MempoolAcceptResult> = serde_json::from_str(json).unwrap();
        assert!(!result[0].allowed);
        assert_eq!(result[0].reject_reason.as_deref(), Some("missing-inputs"));
    }

    #[test]
    fn test_unspent_amount_in_btc() {
        let json = r#"{
            "txid": "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b",
            "vout": 1,
            "address": "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx",
            "scriptPubKey": "0014751e76e8199196d454941c45d1b3a323f1433bd6",
            "amount": 0.00150000,
            "confirmations": 6,
            "spendable": true,
            "solvable": true,
            "safe": true
        }"#;
        let utxo: UnspentOutput = serde_json::from_str(json).unwrap();
        assert_eq!(utxo.amount, Amount::from_sat(150_000));
    }

    #[test]
    fn test_api_response_serialization() {
        let json = ApiResponse::ok("signed".to_string()).to_json();
        assert!(json.contains("\"success\": true"));
        let json = ApiResponse::<()>::err("boom").to_json();
        assert!(json.contains("boom"));
    }
}
