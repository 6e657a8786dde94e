//! Driven ports (Outbound dependencies)

use crate::domain::{
    Identity, IdentityKey, RegistryParams, StoreError, TransferError, Vouch, VouchSlot,
};
use crate::events::EventRecord;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, Hash, Timestamp};

// =============================================================================
// LEDGER STORE
// =============================================================================

/// A single write inside a [`LedgerBatch`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerWrite {
    /// Insert or replace an identity record.
    PutIdentity(Identity),
    /// Point `owner` at its live identity.
    IndexOwner { owner: Address, identity_key: IdentityKey },
    /// Free the owner slot after stake withdrawal.
    ClearOwner(Address),
    AppendPlatform {
        identity_key: IdentityKey,
        platform: String,
    },
    /// Write a vouch into an existing slot, or append a new slot when `slot`
    /// is `None`.
    PutVouch {
        identity_key: IdentityKey,
        slot: Option<VouchSlot>,
        vouch: Vouch,
    },
    BumpRegistrationNonce,
    SetCustodied(Amount),
    SetParams(RegistryParams),
    AppendEvent(EventRecord),
}

/// Writes of one operation, applied all-or-nothing by [`LedgerStore::commit`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerBatch {
    writes: Vec<LedgerWrite>,
}

impl LedgerBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, write: LedgerWrite) -> Self {
        self.writes.push(write);
        self
    }

    pub fn put_identity(self, identity: Identity) -> Self {
        self.push(LedgerWrite::PutIdentity(identity))
    }

    pub fn set_custodied(self, amount: Amount) -> Self {
        self.push(LedgerWrite::SetCustodied(amount))
    }

    pub fn append_event(self, record: EventRecord) -> Self {
        self.push(LedgerWrite::AppendEvent(record))
    }

    pub fn writes(&self) -> &[LedgerWrite] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<LedgerWrite> {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Durable registry state.
///
/// Reads are served from committed state and never fail; a missing record is
/// `None` or empty. Records are never deleted.
pub trait LedgerStore: Send + Sync {
    fn get_identity(&self, identity_key: &IdentityKey) -> Option<Identity>;

    fn identity_of(&self, owner: &Address) -> Option<IdentityKey>;

    fn linked_platforms(&self, identity_key: &IdentityKey) -> Vec<String>;

    /// Every vouch slot on the identity, in slot order.
    fn vouches(&self, identity_key: &IdentityKey) -> Vec<Vouch>;

    /// Slot index of `voucher` on the identity, if it ever vouched.
    fn vouch_slot(&self, identity_key: &IdentityKey, voucher: &Address) -> Option<VouchSlot>;

    /// The voucher's slot contents, active or not.
    fn vouch_for(&self, identity_key: &IdentityKey, voucher: &Address) -> Option<Vouch> {
        let VouchSlot(index) = self.vouch_slot(identity_key, voucher)?;
        self.vouches(identity_key).into_iter().nth(index)
    }

    fn identities(&self) -> Vec<Identity>;

    /// Number of registrations ever committed.
    fn registration_nonce(&self) -> u64;

    /// Balance the registry believes it holds in custody.
    fn custodied(&self) -> Amount;

    fn params(&self) -> RegistryParams;

    /// Sequence of the newest event, 0 when the log is empty.
    fn last_event_sequence(&self) -> u64;

    fn events_since(&self, after: u64, limit: usize) -> Vec<EventRecord>;

    /// Apply every write in the batch atomically, or none of them.
    fn commit(&self, batch: LedgerBatch) -> Result<(), StoreError>;
}

// =============================================================================
// FUNDING SOURCE
// =============================================================================

/// External fungible-token ledger the registry holds custody in.
///
/// `deposit` pulls from a principal into custody (pre-approved, in the manner
/// of `transferFrom`); `release` pays out of custody.
pub trait TokenGateway: Send + Sync {
    fn deposit(&self, from: &Address, amount: Amount) -> Result<(), TransferError>;

    fn release(&self, to: &Address, amount: Amount) -> Result<(), TransferError>;
}

// =============================================================================
// SIGNATURES
// =============================================================================

/// Recovers the signer of a 32-byte digest under the personal-message prefix.
pub trait SignatureVerifier: Send + Sync {
    /// `None` for malformed, malleable or unrecoverable signatures.
    fn recover_digest_signer(&self, digest: &Hash, signature: &[u8]) -> Option<Address>;
}

// =============================================================================
// TIME
// =============================================================================

/// Time source for cooldowns and event timestamps
pub trait TimeSource: Send + Sync {
    /// Get current unix timestamp in seconds
    fn now(&self) -> Timestamp;
}

/// Default time source using system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
