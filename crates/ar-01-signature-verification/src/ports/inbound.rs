//! # Inbound Ports (Driving Ports / API)

use crate::domain::entities::EcdsaSignature;
use crate::domain::errors::SignatureError;
use shared_types::{Address, Hash};

/// Primary Signature Verification API.
///
/// Implementations must be thread-safe (`Send + Sync`) and free of side effects.
/// Only canonical low-S signatures recover a signer.
pub trait SignatureVerificationApi: Send + Sync {
    /// Recover the signer of a raw 32-byte prehash.
    fn recover_signer(
        &self,
        message_hash: &Hash,
        signature: &EcdsaSignature,
    ) -> Result<Address, SignatureError>;

    /// Recover the signer of a registry digest (personal-message prefix applied).
    fn recover_digest_signer(
        &self,
        digest: &Hash,
        signature: &EcdsaSignature,
    ) -> Result<Address, SignatureError>;

    /// Check a registry digest signature against an expected signer.
    fn verify_digest_signer(
        &self,
        digest: &Hash,
        signature: &EcdsaSignature,
        expected: &Address,
    ) -> Result<(), SignatureError>;
}
