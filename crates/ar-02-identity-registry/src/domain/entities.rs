//! # Domain Entities for the Identity Registry
//!
//! ## Type Decisions
//!
//! - `IdentityKey` is a newtype over a 32-byte keccak digest so it cannot be
//!   confused with a message digest at call sites.
//! - Addresses serialize as `0x` hex so events read naturally in JSON.
//! - The terminal state is explicit (`withdrawn_at`) rather than inferred from
//!   a zero stake.

use serde::{Deserialize, Serialize};
use shared_types::{from_hex, to_hex, Address, Amount, EncodingError, Hash, Timestamp};
use std::fmt;
use std::str::FromStr;

/// Unique opaque identifier of a registered identity. Never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey(#[serde(with = "shared_types::hex_bytes")] pub Hash);

impl IdentityKey {
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_hex(&self.0))
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityKey({})", self)
    }
}

impl FromStr for IdentityKey {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_hex::<32>(s).map(IdentityKey)
    }
}

/// Lifecycle position of a registered identity.
///
/// ```text
/// Unregistered ──register──→ Active ──deactivate──→ Deactivating ──withdraw──→ Withdrawn
///                              ↑                        │
///                              └───────reactivate───────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityStatus {
    Active,
    Deactivating,
    Withdrawn,
}

/// One registered agent identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub identity_key: IdentityKey,
    /// Controlling principal. Indexed owner → key until withdrawal.
    #[serde(with = "shared_types::hex_bytes")]
    pub owner: Address,
    /// Address whose signatures count as authored by this identity.
    #[serde(with = "shared_types::hex_bytes")]
    pub signing_key: Address,
    pub name: String,
    /// Opaque external reference (e.g. an off-chain profile URI).
    pub metadata_pointer: String,
    /// Balance held in custody for this identity.
    pub staked_amount: Amount,
    pub registered_at: Timestamp,
    /// `None` while active; set when the deactivation cooldown starts.
    pub deactivated_at: Option<Timestamp>,
    /// Set once the stake has been withdrawn. Terminal.
    pub withdrawn_at: Option<Timestamp>,
    /// Sum of all active vouch amounts on this identity.
    pub total_vouches_received: Amount,
}

impl Identity {
    pub fn status(&self) -> IdentityStatus {
        match (self.deactivated_at, self.withdrawn_at) {
            (_, Some(_)) => IdentityStatus::Withdrawn,
            (Some(_), None) => IdentityStatus::Deactivating,
            (None, None) => IdentityStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == IdentityStatus::Active
    }
}

/// Index of a vouch inside its target identity's vouch list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VouchSlot(pub usize);

/// A staked endorsement of one identity by one voucher.
///
/// Withdrawal zeroes `amount` but keeps the slot, so list positions stay stable
/// and the same voucher reuses the slot when vouching again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vouch {
    #[serde(with = "shared_types::hex_bytes")]
    pub voucher: Address,
    pub amount: Amount,
    /// Time of the most recent vouch into this slot.
    pub timestamp: Timestamp,
}

impl Vouch {
    pub fn is_active(&self) -> bool {
        self.amount > 0
    }
}

/// Inputs to `register`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub name: String,
    pub metadata_pointer: String,
    #[serde(with = "shared_types::hex_bytes")]
    pub signing_key: Address,
    pub stake_amount: Amount,
}

/// Administrator-tunable thresholds, persisted in the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryParams {
    pub min_stake: Amount,
    pub deactivation_cooldown_secs: u64,
}

/// Outcome of a detailed signature check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureCheck {
    /// Recovered signer equals the identity's current signing key.
    Valid,
    /// No identity is stored under the key.
    IdentityNotFound,
    /// The signature recovered to a different address.
    SignerMismatch { recovered: Address },
    /// The signature could not be parsed or recovered.
    Malformed,
}

/// Snapshot of custody accounting, for conservation audits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyReport {
    /// Balance the ledger believes it holds.
    pub custodied: Amount,
    /// Σ staked_amount over all identities.
    pub staked_total: Amount,
    /// Σ amount over all active vouches.
    pub vouched_total: Amount,
    /// Identities whose `total_vouches_received` disagrees with their vouch list.
    pub inconsistent_identities: Vec<IdentityKey>,
}

impl CustodyReport {
    pub fn is_balanced(&self) -> bool {
        self.inconsistent_identities.is_empty()
            && self.staked_total.checked_add(self.vouched_total) == Some(self.custodied)
    }
}
