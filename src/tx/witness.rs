//! Witness and Script Comparison
//!
//! Decides, per input position, whether signing material changed
//! between two snapshots of the same transaction.

use super::selective::SigningFault;
use bitcoin::{Script, Transaction, TxIn, Witness};
use serde::{Deserialize, Serialize};

/// Position-matched witness equality.
///
/// Two witnesses are equal iff they hold the same number of elements and
/// element `k` of one is byte-identical to element `k` of the other.
pub fn witness_equal(a: &Witness, b: &Witness) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

/// Legacy signature script equality (plain bytes)
pub fn script_sig_equal(a: &Script, b: &Script) -> bool {
    a.as_bytes() == b.as_bytes()
}

/// True when neither the witness nor the signature script of an input changed
pub fn input_unchanged(original: &TxIn, signed: &TxIn) -> bool {
    witness_equal(&original.witness, &signed.witness)
        && script_sig_equal(&original.script_sig, &signed.script_sig)
}

/// What changed on one input between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDiff {
    pub index: usize,
    pub witness_changed: bool,
    pub script_sig_changed: bool,
}

impl InputDiff {
    pub fn changed(&self) -> bool {
        self.witness_changed || self.script_sig_changed
    }
}

pub fn diff_input(index: usize, original: &TxIn, signed: &TxIn) -> InputDiff {
    InputDiff {
        index,
        witness_changed: !witness_equal(&original.witness, &signed.witness),
        script_sig_changed: !script_sig_equal(&original.script_sig, &signed.script_sig),
    }
}

/// Diff every input of `signed` against `original`, in index order.
///
/// Fails with `InputCountMismatch` when the two snapshots do not have the
/// same number of inputs; no per-input comparison is attempted then.
pub fn diff_inputs(original: &Transaction, signed: &Transaction) -> Result<Vec<InputDiff>, SigningFault> {
    if original.input.len() != signed.input.len() {
        return Err(SigningFault::InputCountMismatch {
            txid: original.compute_txid(),
            expected: original.input.len(),
            actual: signed.input.len(),
        });
    }

    Ok(original
        .input
        .iter()
        .zip(signed.input.iter())
        .enumerate()
        .map(|(i, (a, b))| diff_input(i, a, b))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::ScriptBuf;

    fn w(items: &[&[u8]]) -> Witness {
        Witness::from_slice(items)
    }

    #[test]
    fn test_empty_witnesses_equal() {
        assert!(witness_equal(&Witness::new(), &Witness::new()));
    }

    #[test]
    fn test_order_matters() {
        let a = w(&[b"sig", b"pubkey"]);
        let b = w(&[b"pubkey", b"sig"]);
        assert!(!witness_equal(&a, &b));
    }

    #[test]
    fn test_length_matters() {
        let a = w(&[b"sig", b"pubkey"]);
        let b = w(&[b"sig", b"pubkey", b"script"]);
        assert!(!witness_equal(&a, &b));
        assert!(!witness_equal(&b, &a));
    }

    #[test]
    fn test_compares_every_position() {
        // Identical first elements must not mask a difference further in
        let a = w(&[b"x", b"x", b"one"]);
        let b = w(&[b"x", b"x", b"two"]);
        assert!(!witness_equal(&a, &b));

        let c = w(&[b"sig", b"pubkey"]);
        assert!(witness_equal(&c, &c.clone()));
    }

    #[test]
    fn test_empty_element_differs_from_missing_element() {
        let a = w(&[b""]);
        assert!(!witness_equal(&a, &Witness::new()));
    }

    #[test]
    fn test_script_sig_equal() {
        let a = ScriptBuf::from_bytes(vec![0x47, 0x30]);
        let b = ScriptBuf::from_bytes(vec![0x47, 0x31]);
        assert!(script_sig_equal(&a, &a.clone()));
        assert!(!script_sig_equal(&a, &b));
        assert!(script_sig_equal(&ScriptBuf::new(), &ScriptBuf::new()));
    }

    #[test]
    fn test_input_diff_changed() {
        let diff = InputDiff { index: 0, witness_changed: false, script_sig_changed: true };
        assert!(diff.changed());
        let diff = InputDiff { index: 0, witness_changed: false, script_sig_changed: false };
        assert!(!diff.changed());
    }
}
