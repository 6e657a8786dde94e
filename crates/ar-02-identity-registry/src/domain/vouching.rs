//! Vouch rules
//!
//! At most one active vouch per (voucher, target). A withdrawn vouch keeps its
//! slot with a zero amount; vouching again writes into the same slot.

use super::{Identity, IdentityStatus, RegistryError, RegistryResult, Vouch};
use shared_types::{Address, Amount, Timestamp};

/// Apply a new vouch to `target`.
///
/// `existing` is the voucher's current slot on the target, if any. Returns the
/// updated target and the vouch record to store in the slot.
pub fn apply_vouch(
    target: &Identity,
    existing: Option<&Vouch>,
    voucher: Address,
    amount: Amount,
    now: Timestamp,
) -> RegistryResult<(Identity, Vouch)> {
    if target.status() != IdentityStatus::Active {
        return Err(RegistryError::IdentityDeactivated);
    }
    if amount == 0 {
        return Err(RegistryError::InvalidAmount);
    }
    if existing.is_some_and(Vouch::is_active) {
        return Err(RegistryError::AlreadyVouched(target.identity_key));
    }

    let total_vouches_received = target
        .total_vouches_received
        .checked_add(amount)
        .ok_or(RegistryError::ArithmeticOverflow)?;

    let updated = Identity {
        total_vouches_received,
        ..target.clone()
    };
    let vouch = Vouch {
        voucher,
        amount,
        timestamp: now,
    };
    Ok((updated, vouch))
}

/// Withdraw the voucher's active vouch from `target`, whatever the target's
/// lifecycle state.
///
/// Returns the updated target, the zeroed slot and the amount to release.
pub fn apply_vouch_withdrawal(
    target: &Identity,
    existing: Option<&Vouch>,
) -> RegistryResult<(Identity, Vouch, Amount)> {
    let vouch = match existing {
        Some(vouch) if vouch.is_active() => vouch,
        _ => return Err(RegistryError::NoVouchFound(target.identity_key)),
    };

    let total_vouches_received = target
        .total_vouches_received
        .checked_sub(vouch.amount)
        .ok_or(RegistryError::ArithmeticOverflow)?;

    let updated = Identity {
        total_vouches_received,
        ..target.clone()
    };
    let zeroed = Vouch {
        amount: 0,
        ..vouch.clone()
    };
    Ok((updated, zeroed, vouch.amount))
}

/// Number of active vouches in a slot list.
pub fn active_vouch_count(vouches: &[Vouch]) -> usize {
    vouches.iter().filter(|v| v.is_active()).count()
}

/// Σ amount over the active vouches in a slot list.
pub fn active_vouch_total(vouches: &[Vouch]) -> Option<Amount> {
    vouches
        .iter()
        .try_fold(0u128, |acc, v| acc.checked_add(v.amount))
}
