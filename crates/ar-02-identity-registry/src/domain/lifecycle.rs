//! Identity lifecycle transitions
//!
//! Each function takes the current record by reference and returns the next
//! record, or the error that rejects the transition. Nothing here touches the
//! store or moves funds.

use super::{
    Identity, IdentityKey, IdentityStatus, RegistrationRequest, RegistryError, RegistryParams,
    RegistryResult,
};
use shared_types::{is_zero_address, Address, Amount, Timestamp};

/// Check a registration request against the current thresholds.
///
/// Owner uniqueness is checked by the caller against the owner index.
pub fn validate_registration(
    request: &RegistrationRequest,
    params: &RegistryParams,
) -> RegistryResult<()> {
    if request.name.trim().is_empty() {
        return Err(RegistryError::InvalidName);
    }
    if is_zero_address(&request.signing_key) {
        return Err(RegistryError::InvalidSigningKey);
    }
    if request.stake_amount < params.min_stake {
        return Err(RegistryError::StakeTooLow {
            provided: request.stake_amount,
            minimum: params.min_stake,
        });
    }
    Ok(())
}

/// Build the record for a freshly registered identity.
pub fn new_identity(
    identity_key: IdentityKey,
    owner: Address,
    request: RegistrationRequest,
    now: Timestamp,
) -> Identity {
    Identity {
        identity_key,
        owner,
        signing_key: request.signing_key,
        name: request.name,
        metadata_pointer: request.metadata_pointer,
        staked_amount: request.stake_amount,
        registered_at: now,
        deactivated_at: None,
        withdrawn_at: None,
        total_vouches_received: 0,
    }
}

/// Platform links may only be added while active.
pub fn ensure_can_link(identity: &Identity) -> RegistryResult<()> {
    match identity.status() {
        IdentityStatus::Active => Ok(()),
        IdentityStatus::Deactivating => Err(RegistryError::IdentityDeactivated),
        IdentityStatus::Withdrawn => Err(RegistryError::NotRegistered),
    }
}

/// Replace the signing key. Allowed while active or deactivating.
pub fn rotate_signing_key(identity: &Identity, new_key: Address) -> RegistryResult<Identity> {
    if identity.status() == IdentityStatus::Withdrawn {
        return Err(RegistryError::NotRegistered);
    }
    if is_zero_address(&new_key) {
        return Err(RegistryError::InvalidSigningKey);
    }
    Ok(Identity {
        signing_key: new_key,
        ..identity.clone()
    })
}

/// Active → Deactivating. Starts the cooldown clock at `now`.
pub fn begin_deactivation(identity: &Identity, now: Timestamp) -> RegistryResult<Identity> {
    match identity.status() {
        IdentityStatus::Active => Ok(Identity {
            deactivated_at: Some(now),
            ..identity.clone()
        }),
        IdentityStatus::Deactivating => Err(RegistryError::AlreadyDeactivating),
        IdentityStatus::Withdrawn => Err(RegistryError::NotRegistered),
    }
}

/// Deactivating → Active. The cooldown is discarded.
pub fn reactivate(identity: &Identity) -> RegistryResult<Identity> {
    match identity.status() {
        IdentityStatus::Deactivating => Ok(Identity {
            deactivated_at: None,
            ..identity.clone()
        }),
        IdentityStatus::Active => Err(RegistryError::NotDeactivating),
        IdentityStatus::Withdrawn => Err(RegistryError::NotRegistered),
    }
}

/// Seconds left before the stake can be withdrawn.
///
/// `None` when the identity is not deactivating; `Some(0)` once the cooldown
/// has elapsed.
pub fn cooldown_remaining(identity: &Identity, now: Timestamp, cooldown_secs: u64) -> Option<u64> {
    if identity.status() != IdentityStatus::Deactivating {
        return None;
    }
    let deactivated_at = identity.deactivated_at?;
    let elapsed = now.saturating_sub(deactivated_at);
    Some(cooldown_secs.saturating_sub(elapsed))
}

/// Deactivating → Withdrawn once the cooldown has elapsed.
///
/// Returns the terminal record and the stake to release to the owner.
pub fn complete_withdrawal(
    identity: &Identity,
    now: Timestamp,
    cooldown_secs: u64,
) -> RegistryResult<(Identity, Amount)> {
    match identity.status() {
        IdentityStatus::Active => return Err(RegistryError::NotDeactivated),
        IdentityStatus::Withdrawn => return Err(RegistryError::NotRegistered),
        IdentityStatus::Deactivating => {}
    }

    match cooldown_remaining(identity, now, cooldown_secs) {
        Some(0) => {}
        Some(remaining_secs) => return Err(RegistryError::CooldownNotElapsed { remaining_secs }),
        None => return Err(RegistryError::NotDeactivated),
    }

    let released = identity.staked_amount;
    let withdrawn = Identity {
        staked_amount: 0,
        withdrawn_at: Some(now),
        ..identity.clone()
    };
    Ok((withdrawn, released))
}
