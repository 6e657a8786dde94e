//! # Signature Errors

use shared_types::{to_hex, Address};
use thiserror::Error;

/// Reasons a signature does not yield a signer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// `r` or `s` is zero or not below the curve order.
    #[error("Signature scalar out of range")]
    ScalarOutOfRange,

    /// `s` lies in the upper half of the curve order (EIP-2).
    #[error("Non-canonical signature: high S value")]
    HighS,

    #[error("Unsupported recovery byte v={0}")]
    InvalidRecoveryId(u8),

    #[error("No public key recovers from this signature")]
    RecoveryFailed,

    #[error("Recovered signer {} does not match expected {}", to_hex(.actual), to_hex(.expected))]
    SignerMismatch { expected: Address, actual: Address },
}
