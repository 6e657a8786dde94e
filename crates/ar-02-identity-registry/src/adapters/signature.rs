//! Signature adapter backed by the AR-01 verification service

use crate::ports::SignatureVerifier;
use ar_01_signature_verification::{
    EcdsaSignature, SignatureVerificationApi, SignatureVerificationService,
};
use shared_types::{Address, Hash};
use tracing::trace;

/// [`SignatureVerifier`] over recoverable secp256k1 signatures.
#[derive(Debug, Clone, Default)]
pub struct EcdsaSignatureVerifier {
    service: SignatureVerificationService,
}

impl EcdsaSignatureVerifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignatureVerifier for EcdsaSignatureVerifier {
    fn recover_digest_signer(&self, digest: &Hash, signature: &[u8]) -> Option<Address> {
        let signature = match EcdsaSignature::from_slice(signature) {
            Ok(sig) => sig,
            Err(e) => {
                trace!(error = %e, len = signature.len(), "Unparseable signature");
                return None;
            }
        };
        self.service.recover_digest_signer(digest, &signature).ok()
    }
}
