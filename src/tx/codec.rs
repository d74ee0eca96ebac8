//! Transaction Codec
//!
//! Hex <-> consensus encoding for `bitcoin::Transaction`, the payload
//! format of every wallet RPC that takes or returns a raw transaction.

use crate::error::{SignerError, SignerResult};
use bitcoin::consensus::encode::{deserialize, serialize};
use bitcoin::Transaction;

/// Serialize a transaction to lowercase consensus hex
pub fn encode_transaction(tx: &Transaction) -> String {
    hex::encode(serialize(tx))
}

/// Decode a raw transaction from consensus hex
///
/// Surrounding whitespace is ignored so hex pasted from a terminal or
/// read from a file decodes the same as a trimmed string.
pub fn decode_transaction(raw_hex: &str) -> SignerResult<Transaction> {
    let trimmed = raw_hex.trim();
    if trimmed.is_empty() {
        return Err(SignerError::invalid_transaction("Empty transaction hex"));
    }

    let raw_bytes = hex::decode(trimmed)?;

    let tx: Transaction = deserialize(&raw_bytes)?;
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use bitcoin::absolute::LockTime;
    use bitcoin::hashes::Hash;
    use bitcoin::transaction::Version;
    use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, TxIn, TxOut, Txid, Witness};

    fn sample_tx() -> Transaction {
        Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::new(Txid::from_byte_array([7u8; 32]), 1),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
                witness: Witness::from_slice(&[vec![0x30, 0x44], vec![0x02, 0x21]]),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(50_000),
                script_pubkey: ScriptBuf::from_bytes(vec![0x00, 0x14]),
            }],
        }
    }

    #[test]
    fn test_encode_decode_preserves_witness() {
        let tx = sample_tx();
        let decoded = decode_transaction(&encode_transaction(&tx)).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.input[0].witness.len(), 2);
    }

    #[test]
    fn test_decode_ignores_surrounding_whitespace() {
        let tx = sample_tx();
        let padded = format!("  {}\n", encode_transaction(&tx));
        assert_eq!(decode_transaction(&padded).unwrap(), tx);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert_eq!(
            decode_transaction("").unwrap_err().code,
            ErrorCode::InvalidTransaction
        );
        assert_eq!(
            decode_transaction("not hex").unwrap_err().code,
            ErrorCode::HexError
        );
        assert_eq!(
            decode_transaction("0200").unwrap_err().code,
            ErrorCode::InvalidTransaction
        );
    }
}
