//! Error taxonomy surfaced by the transaction lifecycle

use std::fmt;

use alloy_primitives::U256;
use thiserror::Error;

use super::abi::ContractKind;
use super::eligibility::format_countdown;

/// Local precondition failures; raised before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("wallet not connected")]
    NotConnected,

    #[error("wrong network: expected chain {expected}, wallet is on chain {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("{0} contract address not configured")]
    MissingContract(ContractKind),

    #[error("amount must be a positive integer (got {input:?})")]
    InvalidAmount { input: String },

    #[error("next claim available in {}", format_countdown(*.remaining))]
    ClaimNotYetAvailable { remaining: u64 },
}

/// Decoded reason for a chain-side execution failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertKind {
    /// Faucet cooldown has not elapsed
    ClaimTooSoon { time_remaining: U256 },
    /// Faucet holds less than one claim
    InsufficientFaucetBalance {
        faucet_balance: U256,
        requested: U256,
    },
    /// Declared custom error without a dedicated mapping
    Custom { name: String, args: Vec<String> },
    /// `Error(string)` revert reason
    Reason(String),
    /// Revert data that matched nothing we know
    Unknown(String),
}

impl fmt::Display for RevertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevertKind::ClaimTooSoon { time_remaining } => {
                let secs = u64::try_from(*time_remaining).unwrap_or(u64::MAX);
                write!(
                    f,
                    "claim too soon: you need to wait before claiming again ({} remaining)",
                    format_countdown(secs)
                )
            }
            RevertKind::InsufficientFaucetBalance { .. } => {
                f.write_str("faucet is empty, please contact the administrator")
            }
            RevertKind::Custom { name, args } => write!(f, "{}({})", name, args.join(", ")),
            RevertKind::Reason(reason) => write!(f, "execution reverted: {}", reason),
            RevertKind::Unknown(detail) => write!(f, "execution reverted: {}", detail),
        }
    }
}

/// User-facing category of a lifecycle failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    AlreadyInProgress,
    UserRejected,
    Submission,
    ContractRevert,
}

impl ErrorCategory {
    pub fn title(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "Invalid request",
            ErrorCategory::AlreadyInProgress => "Busy",
            ErrorCategory::UserRejected => "Rejected",
            ErrorCategory::Submission => "Network error",
            ErrorCategory::ContractRevert => "Reverted",
        }
    }
}

/// Terminal failure of a write operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid call arguments: {0}")]
    Encoding(String),

    #[error("{0} already in progress")]
    AlreadyInProgress(String),

    #[error("transaction was rejected")]
    UserRejected,

    #[error("submission failed: {0}")]
    Submission(String),

    #[error("{0}")]
    ContractRevert(RevertKind),
}

impl TxError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TxError::Validation(_) | TxError::Encoding(_) => ErrorCategory::Validation,
            TxError::AlreadyInProgress(_) => ErrorCategory::AlreadyInProgress,
            TxError::UserRejected => ErrorCategory::UserRejected,
            TxError::Submission(_) => ErrorCategory::Submission,
            TxError::ContractRevert(_) => ErrorCategory::ContractRevert,
        }
    }

    /// Category title plus detail, for inline display
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.category().title(), self)
    }
}

/// A post-action read failed; `partial` holds what was read before it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("refresh failed reading {read}: {message}")]
pub struct RefreshError<P> {
    pub read: String,
    pub message: String,
    pub partial: P,
}

impl<P> RefreshError<P> {
    pub fn new(read: impl Into<String>, message: impl Into<String>, partial: P) -> Self {
        Self {
            read: read.into(),
            message: message.into(),
            partial,
        }
    }
}
