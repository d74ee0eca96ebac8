use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use wallet_guard::types::ApiResponse;
use wallet_guard::utils::logging;
use wallet_guard::{
    decode_transaction, diff_inputs, encode_transaction, verify_selective_signature, FaultKind,
    InputDiff, RpcClient, RpcConfig, SigningFault,
};

#[derive(Parser)]
#[command(name = "wallet-guard", version, about = "Sign exactly one input through a Bitcoin Core wallet")]
struct Cli {
    /// Emit debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show which inputs changed between two raw transactions
    Diff {
        #[arg(long)]
        original: String,
        #[arg(long)]
        signed: String,
    },
    /// Check offline that only one input changed between two raw transactions
    Verify {
        #[arg(long)]
        original: String,
        #[arg(long)]
        signed: String,
        /// Input index that was meant to be signed
        #[arg(long)]
        input: usize,
    },
    /// Have the node wallet sign exactly one input
    Sign {
        #[arg(long)]
        tx: String,
        #[arg(long)]
        input: usize,
        /// JSON file with url/user/password/network; WALLET_GUARD_* env vars override it
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Submit a signed transaction (or only test mempool acceptance)
    Broadcast {
        #[arg(long)]
        tx: String,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Serialize)]
struct Verdict {
    accepted: bool,
    fault_kind: Option<FaultKind>,
    input: Option<usize>,
}

#[derive(Serialize)]
struct SignedTransaction {
    txid: String,
    hex: String,
    complete: bool,
}

#[derive(Serialize)]
struct BroadcastOutcome {
    txid: String,
    submitted: bool,
    accepted: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    if cli.verbose {
        logging::enable_debug();
    }

    match cli.command {
        Command::Diff { original, signed } => {
            let original = decode_transaction(&original).context("decoding --original")?;
            let signed = decode_transaction(&signed).context("decoding --signed")?;
            match diff_inputs(&original, &signed) {
                Ok(diffs) => print_json(&ApiResponse::<Vec<InputDiff>>::ok(diffs)),
                Err(fault) => return Ok(reject(fault)),
            }
        }
        Command::Verify { original, signed, input } => {
            let original = decode_transaction(&original).context("decoding --original")?;
            let signed = decode_transaction(&signed).context("decoding --signed")?;
            if let Err(fault) = verify_selective_signature(&original, &signed, input) {
                return Ok(reject(fault));
            }
            print_json(&ApiResponse::ok(Verdict {
                accepted: true,
                fault_kind: None,
                input: Some(input),
            }));
        }
        Command::Sign { tx, input, config } => {
            let client = connect(config)?;
            let unsigned = decode_transaction(&tx).context("decoding --tx")?;
            match client.safe_sign_raw_transaction_with_wallet(&unsigned, input) {
                Ok(outcome) => print_json(&ApiResponse::ok(SignedTransaction {
                    txid: outcome.tx.compute_txid().to_string(),
                    hex: encode_transaction(&outcome.tx),
                    complete: outcome.complete,
                })),
                Err(fault) => return Ok(reject(fault)),
            }
        }
        Command::Broadcast { tx, config, dry_run } => {
            let client = connect(config)?;
            let signed = decode_transaction(&tx).context("decoding --tx")?;
            let accepted = client.test_mempool_accept(&signed)?;
            let submitted = accepted && !dry_run;
            let txid = if submitted {
                client.send_raw_transaction(&signed)?
            } else {
                signed.compute_txid()
            };
            print_json(&ApiResponse::ok(BroadcastOutcome {
                txid: txid.to_string(),
                submitted,
                accepted,
            }));
            if !accepted {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn connect(config: Option<PathBuf>) -> Result<RpcClient> {
    let base = match config {
        Some(path) => RpcConfig::from_file(path)?,
        None => RpcConfig::default(),
    };
    Ok(RpcClient::new(base.with_env_overrides()?)?)
}

/// Print a rejected round and pick the exit code
fn reject(fault: SigningFault) -> ExitCode {
    let response = ApiResponse {
        success: false,
        data: Some(Verdict {
            accepted: false,
            fault_kind: Some(fault.kind()),
            input: fault.input_index(),
        }),
        error: Some(fault.to_string()),
    };
    print_json(&response);

    if fault.is_security_relevant() {
        ExitCode::from(3)
    } else {
        ExitCode::FAILURE
    }
}

fn print_json<T: Serialize>(response: &ApiResponse<T>) {
    println!("{}", response.to_json());
}
