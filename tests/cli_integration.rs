use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use serde_json::Value;
use std::process::{Command, Output};
use wallet_guard::encode_transaction;

fn unsigned_tx() -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: (0..3u8)
            .map(|i| TxIn {
                previous_output: OutPoint::new(Txid::from_byte_array([i + 1; 32]), 0),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect(),
        output: vec![TxOut {
            value: Amount::from_sat(25_000),
            script_pubkey: ScriptBuf::from_bytes(vec![0x00, 0x14]),
        }],
    }
}

fn signed_on(inputs: &[usize]) -> Transaction {
    let mut tx = unsigned_tx();
    for &i in inputs {
        tx.input[i].witness = Witness::from_slice(&[vec![0x30, i as u8], vec![0x02]]);
    }
    tx
}

fn run_cli(args: &[&str]) -> (Output, Value) {
    let binary_path = assert_cmd::cargo::cargo_bin!("wallet-guard");
    let output = Command::new(binary_path)
        .args(args)
        .output()
        .expect("cli runs");

    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout is utf8");
    let json: Value = serde_json::from_str(&stdout).expect("stdout is valid json");
    (output, json)
}

#[test]
fn verify_accepts_single_input_signature() {
    let original = encode_transaction(&unsigned_tx());
    let signed = encode_transaction(&signed_on(&[1]));

    let (output, json) = run_cli(&["verify", "--original", &original, "--signed", &signed, "--input", "1"]);
    assert!(output.status.success(), "cli failed: {:?}", output);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["accepted"], true);
}

#[test]
fn verify_flags_collateral_signing_with_exit_code() {
    let original = encode_transaction(&unsigned_tx());
    let signed = encode_transaction(&signed_on(&[0, 1]));

    let (output, json) = run_cli(&["verify", "--original", &original, "--signed", &signed, "--input", "1"]);
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(json["success"], false);
    assert_eq!(json["data"]["fault_kind"], "collateral_signing");
    assert_eq!(json["data"]["input"], 0);
    assert!(json["error"].as_str().unwrap().contains("only signed 1"));
}

#[test]
fn verify_flags_unsigned_target() {
    let original = encode_transaction(&unsigned_tx());

    let (output, json) = run_cli(&["verify", "--original", &original, "--signed", &original, "--input", "2"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(json["data"]["fault_kind"], "target_not_signed");
}

#[test]
fn diff_lists_every_input() {
    let original = encode_transaction(&unsigned_tx());
    let signed = encode_transaction(&signed_on(&[2]));

    let (output, json) = run_cli(&["diff", "--original", &original, "--signed", &signed]);
    assert!(output.status.success());

    let diffs = json["data"].as_array().expect("diff array");
    assert_eq!(diffs.len(), 3);
    assert_eq!(diffs[2]["witness_changed"], true);
    assert_eq!(diffs[0]["witness_changed"], false);
    assert_eq!(diffs[1]["script_sig_changed"], false);
}
