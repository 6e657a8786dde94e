//! Identity key derivation
//!
//! `key = keccak256(len(name) || name || owner || registered_at || nonce)`
//!
//! The registration nonce is a registry-wide counter bumped by every
//! successful registration, so two registrations in the same second with the
//! same owner and name still get distinct keys.

use super::IdentityKey;
use ar_01_signature_verification::keccak256;
use shared_types::{Address, Timestamp};

pub fn derive_identity_key(
    name: &str,
    owner: &Address,
    registered_at: Timestamp,
    nonce: u64,
) -> IdentityKey {
    let mut preimage = Vec::with_capacity(8 + name.len() + 20 + 8 + 8);
    // Length prefix keeps (name, owner) boundaries unambiguous
    preimage.extend_from_slice(&(name.len() as u64).to_be_bytes());
    preimage.extend_from_slice(name.as_bytes());
    preimage.extend_from_slice(owner);
    preimage.extend_from_slice(&registered_at.to_be_bytes());
    preimage.extend_from_slice(&nonce.to_be_bytes());
    IdentityKey(keccak256(&preimage))
}
