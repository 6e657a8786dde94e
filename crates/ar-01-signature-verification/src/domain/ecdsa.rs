//! # Signer Recovery (secp256k1)
//!
//! A signature is accepted only in canonical form:
//!
//! - `r` and `s` in `[1, n-1]`
//! - `s <= n/2` (EIP-2), so the high-S twin of a valid signature is rejected
//! - `v` in `{0, 1, 27, 28}`
//!
//! Registry digests are recovered in personal-message form, see
//! [`signed_digest`].

use super::entities::EcdsaSignature;
use super::errors::SignatureError;
use super::hashing::{address_from_pubkey, signed_digest};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::scalar::IsHigh;
use shared_types::{Address, Hash};
use subtle::ConstantTimeEq;

/// Parse `(r, s, v)` into k256 types, rejecting non-canonical encodings.
fn parse_canonical(signature: &EcdsaSignature) -> Result<(Signature, RecoveryId), SignatureError> {
    let parsed = Signature::from_scalars(signature.r, signature.s)
        .map_err(|_| SignatureError::ScalarOutOfRange)?;
    if bool::from(parsed.s().is_high()) {
        return Err(SignatureError::HighS);
    }
    let recovery_id = RecoveryId::new(signature.y_parity()?, false);
    Ok((parsed, recovery_id))
}

/// Recover the address that signed a 32-byte prehash.
pub fn recover_signer(
    message_hash: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    let (parsed, recovery_id) = parse_canonical(signature)?;
    let key = VerifyingKey::recover_from_prehash(message_hash, &parsed, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(address_from_pubkey(&key))
}

/// Recover the signer of a registry digest.
pub fn recover_signed_digest_signer(
    digest: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    recover_signer(&signed_digest(digest), signature)
}

/// Recover the signer of a prehash and require it to be `expected`.
pub fn verify_signer(
    message_hash: &Hash,
    signature: &EcdsaSignature,
    expected: &Address,
) -> Result<Address, SignatureError> {
    let actual = recover_signer(message_hash, signature)?;
    if bool::from(actual[..].ct_eq(&expected[..])) {
        Ok(actual)
    } else {
        Err(SignatureError::SignerMismatch {
            expected: *expected,
            actual,
        })
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    //! Key generation and signing for test suites. Not for production keys.

    use super::*;
    use k256::ecdsa::SigningKey;
    use k256::elliptic_curve::PrimeField;
    use k256::Scalar;

    pub fn generate_keypair() -> (SigningKey, VerifyingKey) {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let verifying_key = *signing_key.verifying_key();
        (signing_key, verifying_key)
    }

    /// Address controlled by a signing key.
    pub fn address_of(signing_key: &SigningKey) -> Address {
        address_from_pubkey(signing_key.verifying_key())
    }

    /// Sign a 32-byte prehash in canonical low-S form with `v` in {27, 28}.
    pub fn sign(message_hash: &Hash, private_key: &SigningKey) -> EcdsaSignature {
        let (sig, recovery_id) = private_key
            .sign_prehash_recoverable(message_hash)
            .expect("signing failed");
        let (sig, y_odd) = match sig.normalize_s() {
            Some(low) => (low, !recovery_id.is_y_odd()),
            None => (sig, recovery_id.is_y_odd()),
        };

        let bytes = sig.to_bytes();
        let mut signature = EcdsaSignature {
            r: [0u8; 32],
            s: [0u8; 32],
            v: 27 + u8::from(y_odd),
        };
        signature.r.copy_from_slice(&bytes[..32]);
        signature.s.copy_from_slice(&bytes[32..]);
        signature
    }

    /// Sign a registry digest (prefix applied), as a wallet would.
    pub fn sign_digest(digest: &Hash, private_key: &SigningKey) -> EcdsaSignature {
        sign(&signed_digest(digest), private_key)
    }

    /// The high-S twin `(r, n - s, v ^ parity)` of a canonical signature.
    pub fn malleate(signature: &EcdsaSignature) -> EcdsaSignature {
        let s = Option::<Scalar>::from(Scalar::from_repr(signature.s.into()))
            .expect("s is a valid scalar");
        let mut twin = signature.clone();
        twin.s.copy_from_slice(&(-s).to_repr());
        twin.v = match signature.v {
            27 => 28,
            28 => 27,
            v => v ^ 1,
        };
        twin
    }
}
