//! Identity Registry Service - Core business logic
//!
//! # Architecture
//! - One writer lock serializes every mutation; reads go straight to the store
//! - Each mutation: preconditions → token transfer → one atomic store batch
//! - A batch that fails after funds moved is compensated by the reverse transfer

use crate::domain::{
    active_vouch_count, apply_vouch, apply_vouch_withdrawal, begin_deactivation,
    complete_withdrawal, credit_custody, custody_report, debit_custody, derive_identity_key,
    ensure_can_link, new_identity, reactivate, rotate_signing_key, validate_registration,
    CustodyReport, Identity, IdentityKey, RegistrationRequest, RegistryConfig, RegistryError,
    RegistryParams, RegistryResult, SignatureCheck, Vouch,
};
use crate::events::{EventRecord, RegistryEvent};
use crate::ports::{
    IdentityRegistryApi, LedgerBatch, LedgerStore, LedgerWrite, SignatureVerifier,
    SystemTimeSource, TimeSource, TokenGateway,
};
use parking_lot::Mutex;
use shared_types::{to_hex, Address, Amount, Hash, Timestamp};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Funds movement that must succeed before a batch is committed.
#[derive(Clone, Copy, Debug)]
enum Settlement {
    None,
    Deposit { from: Address, amount: Amount },
    Release { to: Address, amount: Amount },
}

/// Identity Registry Service
pub struct IdentityRegistryService<S, T, V>
where
    S: LedgerStore,
    T: TokenGateway,
    V: SignatureVerifier,
{
    store: Arc<S>,
    tokens: Arc<T>,
    sig_verifier: Arc<V>,
    config: RegistryConfig,
    time_source: Box<dyn TimeSource>,
    write_lock: Mutex<()>,
}

/// Dependencies for IdentityRegistryService
pub struct RegistryDependencies<S, T, V> {
    pub store: Arc<S>,
    pub tokens: Arc<T>,
    pub sig_verifier: Arc<V>,
    pub config: RegistryConfig,
}

impl<S, T, V> IdentityRegistryService<S, T, V>
where
    S: LedgerStore,
    T: TokenGateway,
    V: SignatureVerifier,
{
    /// Create a new IdentityRegistryService
    pub fn new(deps: RegistryDependencies<S, T, V>) -> Self {
        Self {
            store: deps.store,
            tokens: deps.tokens,
            sig_verifier: deps.sig_verifier,
            config: deps.config,
            time_source: Box::new(SystemTimeSource),
            write_lock: Mutex::new(()),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    /// Next event record. Caller must hold the writer lock.
    fn record(&self, timestamp: Timestamp, event: RegistryEvent) -> EventRecord {
        EventRecord {
            sequence: self.store.last_event_sequence() + 1,
            timestamp,
            event,
        }
    }

    /// The caller's live identity.
    fn live_identity(&self, caller: &Address) -> RegistryResult<Identity> {
        self.store
            .identity_of(caller)
            .and_then(|key| self.store.get_identity(&key))
            .ok_or(RegistryError::NotRegistered)
    }

    fn ensure_admin(&self, caller: &Address, operation: &'static str) -> RegistryResult<()> {
        if self.config.has_admin() && *caller == self.config.admin {
            return Ok(());
        }
        warn!(caller = %to_hex(caller), operation, "Rejected administrative call");
        Err(RegistryError::Unauthorized(*caller))
    }

    /// Move funds, then commit. Reverses the transfer if the commit fails.
    fn settle_and_commit(&self, settlement: Settlement, batch: LedgerBatch) -> RegistryResult<()> {
        match settlement {
            Settlement::Deposit { from, amount } if amount > 0 => {
                self.tokens.deposit(&from, amount)?
            }
            Settlement::Release { to, amount } if amount > 0 => self.tokens.release(&to, amount)?,
            _ => {}
        }

        if let Err(store_err) = self.store.commit(batch) {
            self.compensate(settlement, &store_err.to_string());
            return Err(store_err.into());
        }
        Ok(())
    }

    fn compensate(&self, settlement: Settlement, cause: &str) {
        let (outcome, principal, amount) = match settlement {
            Settlement::Deposit { from, amount } if amount > 0 => {
                (self.tokens.release(&from, amount), from, amount)
            }
            Settlement::Release { to, amount } if amount > 0 => {
                (self.tokens.deposit(&to, amount), to, amount)
            }
            _ => return,
        };

        match outcome {
            Ok(()) => warn!(
                principal = %to_hex(&principal),
                amount = %amount,
                cause,
                "Commit failed, transfer reversed"
            ),
            Err(e) => error!(
                principal = %to_hex(&principal),
                amount = %amount,
                cause,
                error = %e,
                "Commit failed and transfer could not be reversed"
            ),
        }
    }
}

impl<S, T, V> IdentityRegistryApi for IdentityRegistryService<S, T, V>
where
    S: LedgerStore,
    T: TokenGateway,
    V: SignatureVerifier,
{
    fn register(
        &self,
        caller: Address,
        request: RegistrationRequest,
    ) -> RegistryResult<IdentityKey> {
        let _guard = self.write_lock.lock();

        if self.store.identity_of(&caller).is_some() {
            return Err(RegistryError::AlreadyRegistered(caller));
        }
        validate_registration(&request, &self.store.params())?;

        let now = self.now();
        let identity_key =
            derive_identity_key(&request.name, &caller, now, self.store.registration_nonce());
        let stake = request.stake_amount;
        let custodied = credit_custody(self.store.custodied(), stake)?;
        let identity = new_identity(identity_key, caller, request, now);

        let event = RegistryEvent::IdentityRegistered {
            identity_key,
            owner: caller,
            signing_key: identity.signing_key,
            name: identity.name.clone(),
            stake,
        };
        let batch = LedgerBatch::new()
            .put_identity(identity)
            .push(LedgerWrite::IndexOwner {
                owner: caller,
                identity_key,
            })
            .push(LedgerWrite::BumpRegistrationNonce)
            .set_custodied(custodied)
            .append_event(self.record(now, event));

        self.settle_and_commit(
            Settlement::Deposit {
                from: caller,
                amount: stake,
            },
            batch,
        )?;

        info!(
            identity = %identity_key,
            owner = %to_hex(&caller),
            stake = %stake,
            "Identity registered"
        );
        Ok(identity_key)
    }

    fn link_platform(&self, caller: Address, platform: String) -> RegistryResult<()> {
        let _guard = self.write_lock.lock();

        let identity = self.live_identity(&caller)?;
        ensure_can_link(&identity)?;

        let identity_key = identity.identity_key;
        let event = RegistryEvent::PlatformLinked {
            identity_key,
            platform: platform.clone(),
        };
        let batch = LedgerBatch::new()
            .push(LedgerWrite::AppendPlatform {
                identity_key,
                platform,
            })
            .append_event(self.record(self.now(), event));

        self.settle_and_commit(Settlement::None, batch)?;
        info!(identity = %identity_key, "Platform linked");
        Ok(())
    }

    fn update_signing_key(&self, caller: Address, new_signing_key: Address) -> RegistryResult<()> {
        let _guard = self.write_lock.lock();

        let identity = self.live_identity(&caller)?;
        let rotated = rotate_signing_key(&identity, new_signing_key)?;

        let identity_key = identity.identity_key;
        let event = RegistryEvent::SigningKeyUpdated {
            identity_key,
            previous: identity.signing_key,
            current: new_signing_key,
        };
        let batch = LedgerBatch::new()
            .put_identity(rotated)
            .append_event(self.record(self.now(), event));

        self.settle_and_commit(Settlement::None, batch)?;
        info!(
            identity = %identity_key,
            signing_key = %to_hex(&new_signing_key),
            "Signing key updated"
        );
        Ok(())
    }

    fn deactivate(&self, caller: Address) -> RegistryResult<()> {
        let _guard = self.write_lock.lock();

        let identity = self.live_identity(&caller)?;
        let now = self.now();
        let deactivated = begin_deactivation(&identity, now)?;

        let identity_key = identity.identity_key;
        let event = RegistryEvent::IdentityDeactivated {
            identity_key,
            deactivated_at: now,
        };
        let batch = LedgerBatch::new()
            .put_identity(deactivated)
            .append_event(self.record(now, event));

        self.settle_and_commit(Settlement::None, batch)?;
        info!(identity = %identity_key, deactivated_at = now, "Identity deactivated");
        Ok(())
    }

    fn reactivate(&self, caller: Address) -> RegistryResult<()> {
        let _guard = self.write_lock.lock();

        let identity = self.live_identity(&caller)?;
        let reactivated = reactivate(&identity)?;

        let identity_key = identity.identity_key;
        let event = RegistryEvent::IdentityReactivated { identity_key };
        let batch = LedgerBatch::new()
            .put_identity(reactivated)
            .append_event(self.record(self.now(), event));

        self.settle_and_commit(Settlement::None, batch)?;
        info!(identity = %identity_key, "Identity reactivated");
        Ok(())
    }

    fn withdraw_stake(&self, caller: Address) -> RegistryResult<Amount> {
        let _guard = self.write_lock.lock();

        let identity = self.live_identity(&caller)?;
        let now = self.now();
        let cooldown = self.store.params().deactivation_cooldown_secs;
        let (withdrawn, released) = complete_withdrawal(&identity, now, cooldown)?;
        let custodied = debit_custody(self.store.custodied(), released)?;

        let identity_key = identity.identity_key;
        let owner = identity.owner;
        let event = RegistryEvent::StakeWithdrawn {
            identity_key,
            owner,
            amount: released,
        };
        let batch = LedgerBatch::new()
            .put_identity(withdrawn)
            .push(LedgerWrite::ClearOwner(owner))
            .set_custodied(custodied)
            .append_event(self.record(now, event));

        self.settle_and_commit(
            Settlement::Release {
                to: owner,
                amount: released,
            },
            batch,
        )?;

        info!(
            identity = %identity_key,
            owner = %to_hex(&owner),
            amount = %released,
            "Stake withdrawn"
        );
        Ok(released)
    }

    fn vouch(&self, caller: Address, identity_key: IdentityKey, amount: Amount) -> RegistryResult<()> {
        let _guard = self.write_lock.lock();

        let target = self
            .store
            .get_identity(&identity_key)
            .ok_or(RegistryError::IdentityNotFound(identity_key))?;
        let slot = self.store.vouch_slot(&identity_key, &caller);
        let existing = slot.and_then(|_| self.store.vouch_for(&identity_key, &caller));

        let now = self.now();
        let (updated, vouch) = apply_vouch(&target, existing.as_ref(), caller, amount, now)?;
        let custodied = credit_custody(self.store.custodied(), amount)?;

        let event = RegistryEvent::Vouched {
            identity_key,
            voucher: caller,
            amount,
        };
        let batch = LedgerBatch::new()
            .put_identity(updated)
            .push(LedgerWrite::PutVouch {
                identity_key,
                slot,
                vouch,
            })
            .set_custodied(custodied)
            .append_event(self.record(now, event));

        self.settle_and_commit(
            Settlement::Deposit {
                from: caller,
                amount,
            },
            batch,
        )?;

        info!(
            identity = %identity_key,
            voucher = %to_hex(&caller),
            amount = %amount,
            reused_slot = slot.is_some(),
            "Vouch recorded"
        );
        Ok(())
    }

    fn withdraw_vouch(&self, caller: Address, identity_key: IdentityKey) -> RegistryResult<()> {
        let _guard = self.write_lock.lock();

        let target = self
            .store
            .get_identity(&identity_key)
            .ok_or(RegistryError::NoVouchFound(identity_key))?;
        let slot = self.store.vouch_slot(&identity_key, &caller);
        let existing = slot.and_then(|_| self.store.vouch_for(&identity_key, &caller));

        let (updated, zeroed, released) = apply_vouch_withdrawal(&target, existing.as_ref())?;
        let custodied = debit_custody(self.store.custodied(), released)?;

        let event = RegistryEvent::VouchWithdrawn {
            identity_key,
            voucher: caller,
            amount: released,
        };
        let batch = LedgerBatch::new()
            .put_identity(updated)
            .push(LedgerWrite::PutVouch {
                identity_key,
                slot,
                vouch: zeroed,
            })
            .set_custodied(custodied)
            .append_event(self.record(self.now(), event));

        self.settle_and_commit(
            Settlement::Release {
                to: caller,
                amount: released,
            },
            batch,
        )?;

        info!(
            identity = %identity_key,
            voucher = %to_hex(&caller),
            amount = %released,
            "Vouch withdrawn"
        );
        Ok(())
    }

    fn verify_signature(
        &self,
        identity_key: &IdentityKey,
        message_digest: &Hash,
        signature: &[u8],
    ) -> bool {
        self.verify_signature_detailed(identity_key, message_digest, signature)
            == SignatureCheck::Valid
    }

    fn verify_signature_detailed(
        &self,
        identity_key: &IdentityKey,
        message_digest: &Hash,
        signature: &[u8],
    ) -> SignatureCheck {
        let Some(identity) = self.store.get_identity(identity_key) else {
            return SignatureCheck::IdentityNotFound;
        };
        let Some(recovered) = self
            .sig_verifier
            .recover_digest_signer(message_digest, signature)
        else {
            return SignatureCheck::Malformed;
        };

        if recovered == identity.signing_key {
            SignatureCheck::Valid
        } else {
            debug!(
                identity = %identity_key,
                recovered = %to_hex(&recovered),
                "Signature recovered to a different signer"
            );
            SignatureCheck::SignerMismatch { recovered }
        }
    }

    fn get_identity(&self, identity_key: &IdentityKey) -> Option<Identity> {
        self.store.get_identity(identity_key)
    }

    fn identity_of(&self, owner: &Address) -> Option<IdentityKey> {
        self.store.identity_of(owner)
    }

    fn get_linked_platforms(&self, identity_key: &IdentityKey) -> Vec<String> {
        self.store.linked_platforms(identity_key)
    }

    fn get_vouch_count(&self, identity_key: &IdentityKey) -> usize {
        active_vouch_count(&self.store.vouches(identity_key))
    }

    fn get_vouches(&self, identity_key: &IdentityKey) -> Vec<Vouch> {
        self.store.vouches(identity_key)
    }

    fn is_active(&self, identity_key: &IdentityKey) -> bool {
        self.store
            .get_identity(identity_key)
            .is_some_and(|identity| identity.is_active())
    }

    fn params(&self) -> RegistryParams {
        self.store.params()
    }

    fn events_since(&self, after: u64, limit: usize) -> Vec<EventRecord> {
        self.store.events_since(after, limit)
    }

    fn audit_custody(&self) -> CustodyReport {
        // Hold the writer lock so the report sees one committed state
        let _guard = self.write_lock.lock();

        let identities = self.store.identities();
        let vouch_lists: Vec<Vec<Vouch>> = identities
            .iter()
            .map(|identity| self.store.vouches(&identity.identity_key))
            .collect();
        let report = custody_report(
            self.store.custodied(),
            identities
                .iter()
                .zip(vouch_lists.iter().map(Vec::as_slice)),
        );

        if !report.is_balanced() {
            warn!(
                custodied = %report.custodied,
                staked = %report.staked_total,
                vouched = %report.vouched_total,
                inconsistent = report.inconsistent_identities.len(),
                "Custody audit out of balance"
            );
        }
        report
    }

    fn set_min_stake(&self, caller: Address, amount: Amount) -> RegistryResult<()> {
        let _guard = self.write_lock.lock();

        self.ensure_admin(&caller, "set_min_stake")?;
        if amount == 0 {
            return Err(RegistryError::InvalidAmount);
        }

        let params = self.store.params();
        let event = RegistryEvent::MinStakeUpdated {
            previous: params.min_stake,
            current: amount,
        };
        let batch = LedgerBatch::new()
            .push(LedgerWrite::SetParams(RegistryParams {
                min_stake: amount,
                ..params
            }))
            .append_event(self.record(self.now(), event));

        self.settle_and_commit(Settlement::None, batch)?;
        info!(previous = %params.min_stake, current = %amount, "Minimum stake updated");
        Ok(())
    }

    fn set_deactivation_cooldown(&self, caller: Address, seconds: u64) -> RegistryResult<()> {
        let _guard = self.write_lock.lock();

        self.ensure_admin(&caller, "set_deactivation_cooldown")?;

        let params = self.store.params();
        let event = RegistryEvent::DeactivationCooldownUpdated {
            previous: params.deactivation_cooldown_secs,
            current: seconds,
        };
        let batch = LedgerBatch::new()
            .push(LedgerWrite::SetParams(RegistryParams {
                deactivation_cooldown_secs: seconds,
                ..params
            }))
            .append_event(self.record(self.now(), event));

        self.settle_and_commit(Settlement::None, batch)?;
        info!(
            previous = params.deactivation_cooldown_secs,
            current = seconds,
            "Deactivation cooldown updated"
        );
        Ok(())
    }
}
