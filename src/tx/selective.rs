//! Selective Input Signing
//!
//! Turns a wallet's all-or-nothing "sign what you can" call into a
//! verified single-input signing primitive. After the wallet returns,
//! every input is diffed against the snapshot we sent: only the target
//! input may change, and it must change.
//!
//! A round is a guard, not a retry loop. Any fault is terminal and the
//! candidate transaction is dropped; retrying means starting a new round
//! from a fresh unsigned snapshot.

use super::witness::diff_inputs;
use crate::error::{SignerError, SignerResult};
use crate::utils::logging::{LogEntry, LogLevel};
use crate::{log_debug, log_info};
use bitcoin::{Transaction, Txid};
use serde::Serialize;
use std::fmt;

const LOG_MODULE: &str = "selective_sign";

/// Result of a delegated signing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutcome {
    pub tx: Transaction,
    /// Whether the signer considers every input it can reach fully signed
    pub complete: bool,
}

/// Anything that can be asked to sign a whole transaction.
///
/// Implemented by the node RPC client; closures of the same shape work
/// too, which is how tests inject deterministic wallets.
pub trait TransactionSigner {
    fn sign(&self, tx: &Transaction) -> SignerResult<SignOutcome>;
}

impl<F> TransactionSigner for F
where
    F: Fn(&Transaction) -> SignerResult<SignOutcome>,
{
    fn sign(&self, tx: &Transaction) -> SignerResult<SignOutcome> {
        self(tx)
    }
}

/// Why a signing round was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningFault {
    #[error("signing service failed: {0}")]
    Transport(#[from] SignerError),

    #[error("input {index} is out of range for tx {txid} with {input_count} inputs")]
    TargetOutOfRange {
        txid: Txid,
        index: usize,
        input_count: usize,
    },

    #[error("signed tx has {actual} inputs but tx {txid} has {expected}")]
    InputCountMismatch {
        txid: Txid,
        expected: usize,
        actual: usize,
    },

    #[error("neither witness nor signature script changed for input {index} in tx {txid} that we should have signed")]
    TargetNotSigned { txid: Txid, index: usize },

    #[error("witness changed for input {index} in tx {txid} but we should have only signed {target}")]
    CollateralSigning {
        txid: Txid,
        index: usize,
        target: usize,
    },

    #[error("signature script changed for input {index} in tx {txid} but we should have only signed {target}")]
    CollateralScriptMutation {
        txid: Txid,
        index: usize,
        target: usize,
    },

    #[error("signing round for tx {txid} already finished as {state}")]
    RoundClosed { txid: Txid, state: RoundState },
}

/// Fault categories, for callers that branch on the kind of rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    Transport,
    TargetOutOfRange,
    InputCountMismatch,
    TargetNotSigned,
    CollateralSigning,
    CollateralScriptMutation,
    RoundClosed,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::Transport => write!(f, "transport"),
            FaultKind::TargetOutOfRange => write!(f, "target_out_of_range"),
            FaultKind::InputCountMismatch => write!(f, "input_count_mismatch"),
            FaultKind::TargetNotSigned => write!(f, "target_not_signed"),
            FaultKind::CollateralSigning => write!(f, "collateral_signing"),
            FaultKind::CollateralScriptMutation => write!(f, "collateral_script_mutation"),
            FaultKind::RoundClosed => write!(f, "round_closed"),
        }
    }
}

impl SigningFault {
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::Transport(_) => FaultKind::Transport,
            Self::TargetOutOfRange { .. } => FaultKind::TargetOutOfRange,
            Self::InputCountMismatch { .. } => FaultKind::InputCountMismatch,
            Self::TargetNotSigned { .. } => FaultKind::TargetNotSigned,
            Self::CollateralSigning { .. } => FaultKind::CollateralSigning,
            Self::CollateralScriptMutation { .. } => FaultKind::CollateralScriptMutation,
            Self::RoundClosed { .. } => FaultKind::RoundClosed,
        }
    }

    /// The wallet touched an input it was not asked to sign
    pub fn is_security_relevant(&self) -> bool {
        matches!(
            self.kind(),
            FaultKind::CollateralSigning | FaultKind::CollateralScriptMutation
        )
    }

    /// Offending input position, when the fault is about one input
    pub fn input_index(&self) -> Option<usize> {
        match self {
            Self::TargetOutOfRange { index, .. }
            | Self::TargetNotSigned { index, .. }
            | Self::CollateralSigning { index, .. }
            | Self::CollateralScriptMutation { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Check that `signed` differs from `original` on input `target` and nowhere else.
///
/// Inputs are scanned in index order and the first offending position is
/// reported.
pub fn verify_selective_signature(
    original: &Transaction,
    signed: &Transaction,
    target: usize,
) -> Result<(), SigningFault> {
    let txid = original.compute_txid();
    check_target(original, target)?;

    for diff in diff_inputs(original, signed)? {
        if diff.index == target {
            if !diff.changed() {
                return Err(SigningFault::TargetNotSigned { txid, index: diff.index });
            }
        } else if diff.witness_changed {
            return Err(SigningFault::CollateralSigning {
                txid,
                index: diff.index,
                target,
            });
        } else if diff.script_sig_changed {
            return Err(SigningFault::CollateralScriptMutation {
                txid,
                index: diff.index,
                target,
            });
        }
    }

    Ok(())
}

fn check_target(tx: &Transaction, target: usize) -> Result<(), SigningFault> {
    if target >= tx.input.len() {
        return Err(SigningFault::TargetOutOfRange {
            txid: tx.compute_txid(),
            index: target,
            input_count: tx.input.len(),
        });
    }
    Ok(())
}

/// Sign exactly input `target` of `tx` through `signer`, or reject the round.
pub fn safe_sign<S>(signer: &S, tx: &Transaction, target: usize) -> Result<SignOutcome, SigningFault>
where
    S: TransactionSigner + ?Sized,
{
    SigningRound::new(tx, target).run(signer)
}

/// Lifecycle of one signing round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    Unsigned,
    SignedCandidate,
    Accepted,
    Rejected,
}

impl RoundState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundState::Accepted | RoundState::Rejected)
    }
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundState::Unsigned => write!(f, "unsigned"),
            RoundState::SignedCandidate => write!(f, "signed-candidate"),
            RoundState::Accepted => write!(f, "accepted"),
            RoundState::Rejected => write!(f, "rejected"),
        }
    }
}

/// One signing round over one unsigned snapshot and one target input
#[derive(Debug)]
pub struct SigningRound<'a> {
    original: &'a Transaction,
    target: usize,
    state: RoundState,
}

impl<'a> SigningRound<'a> {
    pub fn new(original: &'a Transaction, target: usize) -> Self {
        Self {
            original,
            target,
            state: RoundState::Unsigned,
        }
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Delegate signing, then accept or reject the candidate.
    ///
    /// The signer is not called when the target index is out of range.
    pub fn run<S>(&mut self, signer: &S) -> Result<SignOutcome, SigningFault>
    where
        S: TransactionSigner + ?Sized,
    {
        let txid = self.original.compute_txid();
        if self.state.is_terminal() {
            return Err(SigningFault::RoundClosed { txid, state: self.state });
        }

        log_debug!(LOG_MODULE, "Starting signing round", txid = txid, target = self.target);

        let result = check_target(self.original, self.target)
            .and_then(|_| signer.sign(self.original).map_err(SigningFault::from))
            .and_then(|outcome| {
                self.state = RoundState::SignedCandidate;
                verify_selective_signature(self.original, &outcome.tx, self.target)?;
                Ok(outcome)
            });

        match &result {
            Ok(outcome) => {
                self.state = RoundState::Accepted;
                log_info!(
                    LOG_MODULE,
                    "Signing round accepted",
                    txid = txid,
                    target = self.target,
                    complete = outcome.complete,
                );
            }
            Err(fault) => {
                self.state = RoundState::Rejected;
                rejection_entry(&txid, self.target, fault).log();
            }
        }

        result
    }
}

/// Rejection log line; the fault's Display embeds the full txid, so only
/// its kind and input position are logged
fn rejection_entry(txid: &Txid, target: usize, fault: &SigningFault) -> LogEntry {
    let entry = if fault.is_security_relevant() {
        LogEntry::new(LogLevel::Error, LOG_MODULE, "Wallet signed outside the requested input")
    } else {
        LogEntry::new(LogLevel::Warn, LOG_MODULE, "Signing round rejected")
    };

    let entry = entry
        .field("txid", txid)
        .field("target", target)
        .field("kind", fault.kind());
    match fault {
        SigningFault::Transport(e) => entry.field("reason", &e.message),
        _ => match fault.input_index() {
            Some(index) => entry.field("input", index),
            None => entry,
        },
    }
}
