//! # Registry Properties
//!
//! Random operation sequences against a live registry. Individual
//! operations may fail; the invariants below must hold after every step:
//!
//! - Tokens are conserved between principals and custody
//! - Custody equals the sum of stakes and active vouches
//! - Each owner indexes at most one unwithdrawn identity
//! - Event sequences are dense from 1
//! - Withdrawal succeeds exactly when the cooldown has elapsed

#[cfg(test)]
mod tests {
    use ar_02_identity_registry::{
        EcdsaSignatureVerifier, IdentityKey, IdentityRegistryApi, IdentityRegistryService,
        IdentityStatus, InMemoryLedgerStore, InMemoryTokenLedger, ManualClock, RegistrationRequest,
        RegistryConfig, RegistryDependencies, RegistryError,
    };
    use proptest::prelude::*;
    use shared_types::{Address, Amount};
    use std::sync::Arc;

    const ACTORS: [Address; 4] = [[0xA1; 20], [0xB2; 20], [0xC3; 20], [0xD4; 20]];
    const ADMIN: Address = [0xAD; 20];
    const FUNDING: Amount = 1_000_000;
    const MIN_STAKE: Amount = 100;
    const COOLDOWN: u64 = 1_000;

    type Service =
        IdentityRegistryService<InMemoryLedgerStore, InMemoryTokenLedger, EcdsaSignatureVerifier>;

    #[derive(Debug, Clone)]
    enum Op {
        Register { actor: usize, extra: u32 },
        LinkPlatform { actor: usize },
        Deactivate { actor: usize },
        Reactivate { actor: usize },
        Withdraw { actor: usize },
        Vouch { actor: usize, target: usize, amount: u32 },
        WithdrawVouch { actor: usize, target: usize },
        Advance { secs: u32 },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let actor = 0..ACTORS.len();
        prop_oneof![
            3 => (actor.clone(), 0u32..500).prop_map(|(actor, extra)| Op::Register { actor, extra }),
            1 => actor.clone().prop_map(|actor| Op::LinkPlatform { actor }),
            2 => actor.clone().prop_map(|actor| Op::Deactivate { actor }),
            1 => actor.clone().prop_map(|actor| Op::Reactivate { actor }),
            2 => actor.clone().prop_map(|actor| Op::Withdraw { actor }),
            3 => (actor.clone(), 0usize..8, 0u32..300)
                .prop_map(|(actor, target, amount)| Op::Vouch { actor, target, amount }),
            2 => (actor, 0usize..8).prop_map(|(actor, target)| Op::WithdrawVouch { actor, target }),
            2 => (0u32..1_500).prop_map(|secs| Op::Advance { secs }),
        ]
    }

    struct World {
        service: Service,
        tokens: Arc<InMemoryTokenLedger>,
        clock: ManualClock,
        keys: Vec<IdentityKey>,
    }

    impl World {
        fn new(cooldown: u64) -> Self {
            let config = RegistryConfig {
                admin: ADMIN,
                min_stake: MIN_STAKE,
                deactivation_cooldown_secs: cooldown,
            };
            let tokens = Arc::new(InMemoryTokenLedger::with_allocations(
                ACTORS.iter().map(|actor| (*actor, FUNDING)),
            ));
            let clock = ManualClock::new(1_000_000);
            let service = IdentityRegistryService::new(RegistryDependencies {
                store: Arc::new(InMemoryLedgerStore::new(config.initial_params())),
                tokens: Arc::clone(&tokens),
                sig_verifier: Arc::new(EcdsaSignatureVerifier::new()),
                config,
            })
            .with_time_source(Box::new(clock.clone()));
            Self {
                service,
                tokens,
                clock,
                keys: Vec::new(),
            }
        }

        fn target(&self, index: usize) -> Option<IdentityKey> {
            if self.keys.is_empty() {
                None
            } else {
                Some(self.keys[index % self.keys.len()])
            }
        }

        fn apply(&mut self, op: &Op) {
            match *op {
                Op::Register { actor, extra } => {
                    let request = RegistrationRequest {
                        name: format!("agent-{actor}"),
                        metadata_pointer: String::new(),
                        signing_key: [actor as u8 + 1; 20],
                        stake_amount: MIN_STAKE + Amount::from(extra),
                    };
                    if let Ok(key) = self.service.register(ACTORS[actor], request) {
                        self.keys.push(key);
                    }
                }
                Op::LinkPlatform { actor } => {
                    let _ = self
                        .service
                        .link_platform(ACTORS[actor], format!("site:{}", self.keys.len()));
                }
                Op::Deactivate { actor } => {
                    let _ = self.service.deactivate(ACTORS[actor]);
                }
                Op::Reactivate { actor } => {
                    let _ = self.service.reactivate(ACTORS[actor]);
                }
                Op::Withdraw { actor } => {
                    let _ = self.service.withdraw_stake(ACTORS[actor]);
                }
                Op::Vouch {
                    actor,
                    target,
                    amount,
                } => {
                    if let Some(key) = self.target(target) {
                        let _ = self
                            .service
                            .vouch(ACTORS[actor], key, Amount::from(amount));
                    }
                }
                Op::WithdrawVouch { actor, target } => {
                    if let Some(key) = self.target(target) {
                        let _ = self.service.withdraw_vouch(ACTORS[actor], key);
                    }
                }
                Op::Advance { secs } => self.clock.advance(u64::from(secs)),
            }
        }

        fn circulating(&self) -> Amount {
            ACTORS
                .iter()
                .map(|actor| self.tokens.balance_of(actor))
                .sum::<Amount>()
                + self.tokens.custody_balance()
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Custody, the ledger and the token balances agree after any sequence.
        #[test]
        fn custody_is_conserved(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let mut world = World::new(COOLDOWN);
            let total = world.circulating();

            for op in &ops {
                world.apply(op);

                prop_assert_eq!(world.circulating(), total);
                let report = world.service.audit_custody();
                prop_assert!(report.is_balanced(), "unbalanced after {:?}: {:?}", op, report);
                prop_assert_eq!(report.custodied, world.tokens.custody_balance());
            }
        }

        /// Owners index exactly their unwithdrawn identity.
        #[test]
        fn owner_index_tracks_unwithdrawn_identities(
            ops in prop::collection::vec(op_strategy(), 1..60)
        ) {
            let mut world = World::new(COOLDOWN);
            for op in &ops {
                world.apply(op);
            }

            for owner in ACTORS {
                let live: Vec<IdentityKey> = world
                    .keys
                    .iter()
                    .filter_map(|key| world.service.get_identity(key))
                    .filter(|identity| {
                        identity.owner == owner && identity.status() != IdentityStatus::Withdrawn
                    })
                    .map(|identity| identity.identity_key)
                    .collect();
                prop_assert!(live.len() <= 1);
                prop_assert_eq!(world.service.identity_of(&owner), live.first().copied());
            }
        }

        /// The event log has one record per successful mutation, numbered from 1.
        #[test]
        fn event_sequences_are_dense(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let mut world = World::new(COOLDOWN);
            for op in &ops {
                world.apply(op);
            }

            let events = world.service.events_since(0, usize::MAX);
            for (index, record) in events.iter().enumerate() {
                prop_assert_eq!(record.sequence, index as u64 + 1);
            }
            let registrations = events
                .iter()
                .filter(|record| record.event.name() == "IdentityRegistered")
                .count();
            prop_assert_eq!(registrations, world.keys.len());
        }

        /// Withdrawal succeeds iff at least `cooldown` seconds have passed.
        #[test]
        fn withdrawal_respects_cooldown(cooldown in 0u64..100_000, elapsed in 0u64..200_000) {
            let world = World::new(cooldown);
            let owner = ACTORS[0];
            let request = RegistrationRequest {
                name: "agent".into(),
                metadata_pointer: String::new(),
                signing_key: [0x01; 20],
                stake_amount: MIN_STAKE,
            };
            world.service.register(owner, request).unwrap();
            world.service.deactivate(owner).unwrap();
            world.clock.advance(elapsed);

            match world.service.withdraw_stake(owner) {
                Ok(released) => {
                    prop_assert!(elapsed >= cooldown);
                    prop_assert_eq!(released, MIN_STAKE);
                    prop_assert_eq!(world.tokens.balance_of(&owner), FUNDING);
                }
                Err(RegistryError::CooldownNotElapsed { remaining_secs }) => {
                    prop_assert!(elapsed < cooldown);
                    prop_assert_eq!(remaining_secs, cooldown - elapsed);
                }
                Err(other) => {
                    return Err(TestCaseError::fail(format!("unexpected error: {other}")));
                }
            }
        }
    }
}
