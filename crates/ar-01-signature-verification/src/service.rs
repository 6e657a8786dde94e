//! # Signature Verification Service
//!
//! Implements [`SignatureVerificationApi`] over the domain recovery functions.

use crate::domain::ecdsa;
use crate::domain::entities::EcdsaSignature;
use crate::domain::errors::SignatureError;
use crate::domain::hashing::signed_digest;
use crate::ports::inbound::SignatureVerificationApi;
use shared_types::{Address, Hash};
use tracing::trace;

/// Signature Verification Service.
///
/// Stateless; cheap to share behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerificationService;

impl SignatureVerificationService {
    pub fn new() -> Self {
        Self
    }
}

impl SignatureVerificationApi for SignatureVerificationService {
    fn recover_signer(
        &self,
        message_hash: &Hash,
        signature: &EcdsaSignature,
    ) -> Result<Address, SignatureError> {
        ecdsa::recover_signer(message_hash, signature)
    }

    fn recover_digest_signer(
        &self,
        digest: &Hash,
        signature: &EcdsaSignature,
    ) -> Result<Address, SignatureError> {
        ecdsa::recover_signed_digest_signer(digest, signature).inspect_err(|e| {
            trace!(error = %e, "Digest signer recovery failed");
        })
    }

    fn verify_digest_signer(
        &self,
        digest: &Hash,
        signature: &EcdsaSignature,
        expected: &Address,
    ) -> Result<(), SignatureError> {
        ecdsa::verify_signer(&signed_digest(digest), signature, expected).map(|_| ())
    }
}
