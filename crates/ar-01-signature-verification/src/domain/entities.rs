//! # Domain Entities

use super::errors::SignatureError;
use serde::{Deserialize, Serialize};

/// Length of a serialized recoverable signature: `r (32) || s (32) || v (1)`.
pub const ECDSA_SIGNATURE_LEN: usize = 65;

/// Recoverable secp256k1 signature in wallet layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Recovery byte: 0/1, or 27/28 in the legacy offset form.
    pub v: u8,
}

impl EcdsaSignature {
    /// Parse the 65-byte `r || s || v` wire form.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        let bytes: &[u8; ECDSA_SIGNATURE_LEN] =
            bytes.try_into().map_err(|_| SignatureError::InvalidLength {
                expected: ECDSA_SIGNATURE_LEN,
                actual: bytes.len(),
            })?;

        let (r, rest) = bytes.split_at(32);
        let (s, v) = rest.split_at(32);
        let mut signature = Self {
            r: [0u8; 32],
            s: [0u8; 32],
            v: v[0],
        };
        signature.r.copy_from_slice(r);
        signature.s.copy_from_slice(s);
        Ok(signature)
    }

    pub fn to_bytes(&self) -> [u8; ECDSA_SIGNATURE_LEN] {
        let mut out = [0u8; ECDSA_SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// Whether `R` has an odd y-coordinate, decoded from `v`.
    pub fn y_parity(&self) -> Result<bool, SignatureError> {
        match self.v {
            0 | 27 => Ok(false),
            1 | 28 => Ok(true),
            other => Err(SignatureError::InvalidRecoveryId(other)),
        }
    }
}
