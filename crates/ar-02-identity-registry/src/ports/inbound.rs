//! Driving ports (Inbound API)

use crate::domain::{
    CustodyReport, Identity, IdentityKey, RegistrationRequest, RegistryParams, RegistryResult,
    SignatureCheck, Vouch,
};
use crate::events::EventRecord;
use shared_types::{Address, Amount, Hash};

/// Primary Identity Registry API
///
/// Every mutating call takes the authenticated `caller` supplied by the host.
/// The registry never authenticates callers itself.
pub trait IdentityRegistryApi: Send + Sync {
    // === Lifecycle ===

    /// Register a new identity owned by `caller`, taking its stake into custody.
    fn register(&self, caller: Address, request: RegistrationRequest)
        -> RegistryResult<IdentityKey>;

    /// Append a self-asserted platform link to the caller's identity.
    fn link_platform(&self, caller: Address, platform: String) -> RegistryResult<()>;

    /// Rotate the caller's signing key.
    fn update_signing_key(&self, caller: Address, new_signing_key: Address) -> RegistryResult<()>;

    /// Start the withdrawal cooldown.
    fn deactivate(&self, caller: Address) -> RegistryResult<()>;

    /// Cancel a pending deactivation.
    fn reactivate(&self, caller: Address) -> RegistryResult<()>;

    /// Release the full stake once the cooldown has elapsed.
    ///
    /// Returns the amount released to the owner.
    fn withdraw_stake(&self, caller: Address) -> RegistryResult<Amount>;

    // === Vouching ===

    /// Stake `amount` on `identity_key` as the caller's endorsement.
    fn vouch(&self, caller: Address, identity_key: IdentityKey, amount: Amount)
        -> RegistryResult<()>;

    /// Withdraw the caller's vouch and release its amount.
    fn withdraw_vouch(&self, caller: Address, identity_key: IdentityKey) -> RegistryResult<()>;

    // === Signatures ===

    /// True iff `signature` over the prefixed `message_digest` recovers to the
    /// identity's current signing key.
    fn verify_signature(
        &self,
        identity_key: &IdentityKey,
        message_digest: &Hash,
        signature: &[u8],
    ) -> bool;

    /// Same check as [`Self::verify_signature`], with the reason on failure.
    fn verify_signature_detailed(
        &self,
        identity_key: &IdentityKey,
        message_digest: &Hash,
        signature: &[u8],
    ) -> SignatureCheck;

    // === Queries ===

    fn get_identity(&self, identity_key: &IdentityKey) -> Option<Identity>;

    /// Live identity of `owner`. Cleared by stake withdrawal.
    fn identity_of(&self, owner: &Address) -> Option<IdentityKey>;

    fn get_linked_platforms(&self, identity_key: &IdentityKey) -> Vec<String>;

    /// Number of active vouches on the identity.
    fn get_vouch_count(&self, identity_key: &IdentityKey) -> usize;

    /// All vouch slots on the identity, including withdrawn (zero) ones.
    fn get_vouches(&self, identity_key: &IdentityKey) -> Vec<Vouch>;

    fn is_active(&self, identity_key: &IdentityKey) -> bool;

    fn params(&self) -> RegistryParams;

    /// Events with sequence strictly greater than `after`, oldest first.
    fn events_since(&self, after: u64, limit: usize) -> Vec<EventRecord>;

    /// Conservation snapshot of custody against stakes and vouches.
    fn audit_custody(&self) -> CustodyReport;

    // === Administration ===

    fn set_min_stake(&self, caller: Address, amount: Amount) -> RegistryResult<()>;

    fn set_deactivation_cooldown(&self, caller: Address, seconds: u64) -> RegistryResult<()>;
}
