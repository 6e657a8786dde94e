//! # Core Primitive Entities
//!
//! Fixed-width aliases shared by the signature verifier and the registry.

/// A 32-byte keccak-256 digest.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address (last 20 bytes of keccak256(pubkey)).
///
/// Owners, signing keys, vouchers and the administrator are all addresses.
pub type Address = [u8; 20];

/// Fungible token amount in base units.
///
/// u128 covers every practical supply while keeping arithmetic native.
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// The all-zero address. Never a valid signing key or administrator.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Seconds in one day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Returns true if the address is the zero address.
pub fn is_zero_address(address: &Address) -> bool {
    address == &ZERO_ADDRESS
}
