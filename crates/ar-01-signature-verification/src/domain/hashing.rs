//! Keccak-256 digests and address derivation

use k256::ecdsa::VerifyingKey;
use sha3::{Digest, Keccak256};
use shared_types::{Address, Hash};

/// Prefix prepended to a 32-byte digest before it is signed.
pub const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

/// The hash a wallet actually signs for a registry digest:
/// `keccak256(PERSONAL_MESSAGE_PREFIX || digest)`.
pub fn signed_digest(digest: &Hash) -> Hash {
    Keccak256::new()
        .chain_update(PERSONAL_MESSAGE_PREFIX)
        .chain_update(digest)
        .finalize()
        .into()
}

/// Last 20 bytes of the keccak hash of the uncompressed public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    // Drop the 0x04 SEC1 tag
    let hash = keccak256(&encoded.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}
