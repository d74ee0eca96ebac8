//! Bitcoin Core Wallet RPC Client
//!
//! Blocking JSON-RPC over HTTP POST with basic auth. Each call decodes
//! the node's answer into a typed result struct before anything else
//! sees it.

use crate::error::{ErrorCode, SignerError, SignerResult};
use crate::tx::{decode_transaction, encode_transaction, safe_sign, SignOutcome, SigningFault, TransactionSigner};
use crate::types::*;
use crate::utils::network_config::RpcConfig;
use crate::{log_debug, log_warn};
use bitcoin::{Address, Amount, Transaction, Txid};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const LOG_MODULE: &str = "rpc";

/// Wallet-scoped client for one Bitcoin Core node
pub struct RpcClient {
    http: Client,
    config: RpcConfig,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Build a client; the endpoint is validated but not contacted
    pub fn new(config: RpcConfig) -> SignerResult<Self> {
        let validation = config.ensure_valid()?;
        for warning in &validation.warnings {
            log_warn!(LOG_MODULE, warning.as_str());
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .user_agent("wallet-guard/0.1")
            .build()
            .map_err(|e| SignerError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Issue one JSON-RPC call and decode its `result` as `T`
    pub fn call<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> SignerResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        log_debug!(LOG_MODULE, "RPC call", method = method, id = id);

        let response = self
            .http
            .post(&self.config.url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&RpcRequest {
                jsonrpc: "1.0",
                id,
                method,
                params,
            })
            .send()?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(SignerError::new(ErrorCode::AuthError, "Node rejected RPC credentials"));
        }

        // bitcoind reports RPC errors with a 4xx/5xx status and a JSON body
        let body = response.text()?;
        decode_rpc_response(method, status.as_u16(), &body)
    }

    // =========================================================================
    // Mempool
    // =========================================================================

    /// Whether the node's mempool holds `txid`; any RPC failure counts as "no"
    pub fn mempool_has_entry(&self, txid: &Txid) -> bool {
        has_mempool_entry(txid, self.call("getmempoolentry", &[json!(txid)]))
    }

    /// Dry-run a transaction against the node's mempool policy
    pub fn test_mempool_accept(&self, tx: &Transaction) -> SignerResult<bool> {
        let raw = encode_transaction(tx);
        let results: Vec<MempoolAcceptResult> = self.call("testmempoolaccept", &[json!([raw])])?;
        first_accept_result(results)
    }

    // =========================================================================
    // Transaction lifecycle
    // =========================================================================

    /// Unsigned, unfunded transaction paying `amount` to `address`
    pub fn create_raw_transaction(&self, address: &str, amount: Amount) -> SignerResult<Transaction> {
        let address = Address::from_str(address.trim())?.require_network(self.config.network)?;

        let mut outputs = serde_json::Map::new();
        outputs.insert(address.to_string(), json!(amount.to_btc()));

        let raw: String = self.call("createrawtransaction", &[json!([]), Value::Object(outputs)])?;
        decode_transaction(&raw)
    }

    /// Let the wallet pick inputs and add change
    pub fn fund_raw_transaction(&self, tx: &Transaction) -> SignerResult<Transaction> {
        let result: FundRawTransactionResult =
            self.call("fundrawtransaction", &[json!(encode_transaction(tx))])?;

        log_debug!(LOG_MODULE, "Funded transaction", fee = result.fee, changepos = result.changepos);
        decode_transaction(&result.hex)
    }

    pub fn send_raw_transaction(&self, tx: &Transaction) -> SignerResult<Txid> {
        self.call("sendrawtransaction", &[json!(encode_transaction(tx))])
    }

    /// Ask the wallet to sign every input it holds keys for
    pub fn sign_raw_transaction_with_wallet(&self, tx: &Transaction) -> SignerResult<SignOutcome> {
        let result: SignRawTransactionResult =
            self.call("signrawtransactionwithwallet", &[json!(encode_transaction(tx))])?;

        for input_error in &result.errors {
            log_warn!(
                LOG_MODULE,
                "Wallet could not sign input",
                txid = input_error.txid,
                vout = input_error.vout,
                error = input_error.error,
            );
        }

        Ok(SignOutcome {
            tx: decode_transaction(&result.hex)?,
            complete: result.complete,
        })
    }

    /// Sign only input `input_to_sign` and prove nothing else was touched
    pub fn safe_sign_raw_transaction_with_wallet(
        &self,
        tx: &Transaction,
        input_to_sign: usize,
    ) -> Result<SignOutcome, SigningFault> {
        safe_sign(self, tx, input_to_sign)
    }

    // =========================================================================
    // Outputs and addresses
    // =========================================================================

    /// `None` when the output is spent or unknown
    pub fn get_tx_out(&self, txid: &Txid, vout: u32) -> SignerResult<Option<TxOutInfo>> {
        self.call("gettxout", &[json!(txid), json!(vout), json!(false)])
    }

    pub fn list_unspent(&self) -> SignerResult<Vec<UnspentOutput>> {
        self.call("listunspent", &[])
    }

    pub fn get_address_info(&self, address: &str) -> SignerResult<AddressInfo> {
        self.call("getaddressinfo", &[json!(address)])
    }

    /// Owned by this wallet and never received funds.
    ///
    /// Walks every receiving address of the wallet, so it is slow on large
    /// wallets.
    pub fn is_my_fresh_address(&self, address: &str) -> SignerResult<bool> {
        let info = self.get_address_info(address)?;
        is_fresh(&info, || self.call("listreceivedbyaddress", &[]))
    }
}

impl TransactionSigner for RpcClient {
    fn sign(&self, tx: &Transaction) -> SignerResult<SignOutcome> {
        self.sign_raw_transaction_with_wallet(tx)
    }
}

fn has_mempool_entry(txid: &Txid, entry: SignerResult<Value>) -> bool {
    match entry {
        Ok(entry) => !entry.is_null(),
        Err(e) => {
            log_debug!(LOG_MODULE, "No mempool entry", txid = txid, reason = e);
            false
        }
    }
}

/// `testmempoolaccept` answers one entry per submitted transaction
fn first_accept_result(results: Vec<MempoolAcceptResult>) -> SignerResult<bool> {
    let result = results
        .into_iter()
        .next()
        .ok_or_else(|| SignerError::parse_error("Empty testmempoolaccept result"))?;

    if !result.allowed {
        log_debug!(
            LOG_MODULE,
            "Mempool would reject transaction",
            txid = result.txid,
            reason = result.reject_reason.as_deref().unwrap_or("unknown"),
        );
    }
    Ok(result.allowed)
}

/// The received list is only fetched for addresses the wallet owns
fn is_fresh<F>(info: &AddressInfo, received: F) -> SignerResult<bool>
where
    F: FnOnce() -> SignerResult<Vec<ReceivedByAddress>>,
{
    if !info.is_mine {
        return Ok(false);
    }
    Ok(is_unused(&info.address, &received()?))
}

fn is_unused(address: &str, received: &[ReceivedByAddress]) -> bool {
    !received.iter().any(|r| r.address == address)
}

/// Turn a raw HTTP body into the call's typed result
pub(crate) fn decode_rpc_response<T: DeserializeOwned>(
    method: &str,
    status: u16,
    body: &str,
) -> SignerResult<T> {
    let response: RpcResponse = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) if (200..300).contains(&status) => {
            return Err(SignerError::parse_error(format!(
                "Malformed {} response: {}",
                method, e
            )));
        }
        Err(_) => {
            return Err(SignerError::network_error(format!(
                "{} failed with HTTP {}",
                method, status
            )));
        }
    };

    if let Some(error) = response.error {
        return Err(SignerError::rpc(error.code, format!("{}: {}", method, error.message)));
    }

    let result = response.result.unwrap_or(Value::Null);
    serde_json::from_value(result).map_err(|e| {
        SignerError::parse_error(format!("Unexpected {} result: {}", method, e))
    })
}
