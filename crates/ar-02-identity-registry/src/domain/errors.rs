//! Error types for the Identity Registry
//!
//! Every failure is a synchronous rejection of the triggering operation;
//! nothing is partially applied.

use super::IdentityKey;
use shared_types::{Address, Amount};
use thiserror::Error;

/// Failure reported by the external funding source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("Insufficient allowance: required {required}, approved {approved}")]
    InsufficientAllowance { required: Amount, approved: Amount },

    #[error("Insufficient custody balance: required {required}, held {held}")]
    InsufficientCustody { required: Amount, held: Amount },

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Failure reported by a ledger store backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Snapshot corrupted: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid write: {0}")]
    InvalidWrite(String),
}

/// Registry error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Owner {0:?} already has a live identity")]
    AlreadyRegistered(Address),

    #[error("Stake too low: provided {provided}, minimum {minimum}")]
    StakeTooLow { provided: Amount, minimum: Amount },

    #[error("Identity name must not be empty")]
    InvalidName,

    #[error("Signing key must not be the zero address")]
    InvalidSigningKey,

    #[error("Caller has no registered identity")]
    NotRegistered,

    #[error("Identity not found: {0}")]
    IdentityNotFound(IdentityKey),

    #[error("Identity is deactivated")]
    IdentityDeactivated,

    #[error("Identity is already deactivating")]
    AlreadyDeactivating,

    #[error("Identity is not deactivating")]
    NotDeactivating,

    #[error("Identity has not been deactivated")]
    NotDeactivated,

    #[error("Deactivation cooldown not elapsed: {remaining_secs}s remaining")]
    CooldownNotElapsed { remaining_secs: u64 },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Caller already vouches for {0}")]
    AlreadyVouched(IdentityKey),

    #[error("No active vouch from caller for {0}")]
    NoVouchFound(IdentityKey),

    #[error("Caller {0:?} is not the registry administrator")]
    Unauthorized(Address),

    #[error("Token transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    #[error("Custody accounting overflow")]
    ArithmeticOverflow,

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Coarse classification of a [`RegistryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-correctable: wrong state, bad input, missing record, not authorized.
    PreconditionViolation,
    /// The funding source refused to move balance.
    FundsTransferFailure,
    /// The cooldown has not elapsed yet; resubmit later.
    TimingViolation,
    /// Backend failure outside the state machine.
    Storage,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::TransferFailed(_) => ErrorKind::FundsTransferFailure,
            RegistryError::CooldownNotElapsed { .. } => ErrorKind::TimingViolation,
            RegistryError::Storage(_) | RegistryError::ArithmeticOverflow => ErrorKind::Storage,
            _ => ErrorKind::PreconditionViolation,
        }
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
