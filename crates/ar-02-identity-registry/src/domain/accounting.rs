//! Custody accounting
//!
//! custodied == Σ staked_amount + Σ active vouch amount, after every commit.

use super::{active_vouch_total, CustodyReport, Identity, RegistryError, RegistryResult, Vouch};
use shared_types::Amount;

/// Custody balance after taking `amount` in.
pub fn credit_custody(custodied: Amount, amount: Amount) -> RegistryResult<Amount> {
    custodied
        .checked_add(amount)
        .ok_or(RegistryError::ArithmeticOverflow)
}

/// Custody balance after paying `amount` out.
pub fn debit_custody(custodied: Amount, amount: Amount) -> RegistryResult<Amount> {
    custodied
        .checked_sub(amount)
        .ok_or(RegistryError::ArithmeticOverflow)
}

/// Build a conservation report from every identity and its vouch list.
pub fn custody_report<'a, I>(custodied: Amount, records: I) -> CustodyReport
where
    I: IntoIterator<Item = (&'a Identity, &'a [Vouch])>,
{
    let mut staked_total: Amount = 0;
    let mut vouched_total: Amount = 0;
    let mut inconsistent_identities = Vec::new();

    for (identity, vouches) in records {
        staked_total = staked_total.saturating_add(identity.staked_amount);
        match active_vouch_total(vouches) {
            Some(sum) => {
                vouched_total = vouched_total.saturating_add(sum);
                if sum != identity.total_vouches_received {
                    inconsistent_identities.push(identity.identity_key);
                }
            }
            None => inconsistent_identities.push(identity.identity_key),
        }
    }
    inconsistent_identities.sort();

    CustodyReport {
        custodied,
        staked_total,
        vouched_total,
        inconsistent_identities,
    }
}
