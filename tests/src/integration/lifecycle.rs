//! # Lifecycle Across Restarts
//!
//! Identities, vouches, params and the event log must survive a restart of
//! the snapshot-backed ledger, and the cooldown clock keeps running while
//! the registry is down.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use ar_02_identity_registry::domain::DEFAULT_DEACTIVATION_COOLDOWN_SECS;
    use ar_02_identity_registry::{
        ErrorKind, IdentityRegistryApi, IdentityStatus, RegistryError,
    };

    #[test]
    fn test_identity_survives_restart() {
        let registry = Registry::open();
        let key = registry
            .service
            .register(ALICE, request("alice", [0x5A; 20]))
            .unwrap();
        registry
            .service
            .link_platform(ALICE, "github:alice".into())
            .unwrap();

        let registry = registry.restart();
        let identity = registry.service.get_identity(&key).unwrap();
        assert_eq!(identity.owner, ALICE);
        assert_eq!(identity.name, "alice");
        assert_eq!(identity.staked_amount, MIN_STAKE);
        assert_eq!(registry.service.identity_of(&ALICE), Some(key));
        assert_eq!(
            registry.service.get_linked_platforms(&key),
            vec!["github:alice".to_string()]
        );
        assert!(registry.service.audit_custody().is_balanced());
    }

    #[test]
    fn test_cooldown_spans_restart() {
        let registry = Registry::open();
        let key = registry
            .service
            .register(ALICE, request("alice", [0x5A; 20]))
            .unwrap();
        registry.service.deactivate(ALICE).unwrap();

        registry.clock.advance(DEFAULT_DEACTIVATION_COOLDOWN_SECS / 2);
        let registry = registry.restart();
        let err = registry.service.withdraw_stake(ALICE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimingViolation);

        registry.clock.advance(DEFAULT_DEACTIVATION_COOLDOWN_SECS / 2);
        let registry = registry.restart();
        assert_eq!(registry.service.withdraw_stake(ALICE).unwrap(), MIN_STAKE);
        assert_eq!(registry.tokens.balance_of(&ALICE), FUNDING);

        let identity = registry.service.get_identity(&key).unwrap();
        assert_eq!(identity.status(), IdentityStatus::Withdrawn);
        assert_eq!(registry.service.identity_of(&ALICE), None);
    }

    #[test]
    fn test_admin_params_survive_restart() {
        let registry = Registry::open();
        registry.service.set_min_stake(ADMIN, 2 * MIN_STAKE).unwrap();
        registry.service.set_deactivation_cooldown(ADMIN, 60).unwrap();

        // Configured defaults only seed a fresh ledger.
        let registry = registry.restart();
        let params = registry.service.params();
        assert_eq!(params.min_stake, 2 * MIN_STAKE);
        assert_eq!(params.deactivation_cooldown_secs, 60);

        assert!(matches!(
            registry.service.register(ALICE, request("alice", [0x5A; 20])),
            Err(RegistryError::StakeTooLow { .. })
        ));
    }

    #[test]
    fn test_event_log_continues_after_restart() {
        let registry = Registry::open();
        registry
            .service
            .register(ALICE, request("alice", [0x5A; 20]))
            .unwrap();
        registry.service.deactivate(ALICE).unwrap();

        let registry = registry.restart();
        registry.service.reactivate(ALICE).unwrap();

        let events = registry.service.events_since(0, usize::MAX);
        let sequences: Vec<u64> = events.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        let names: Vec<&str> = events.iter().map(|r| r.event.name()).collect();
        assert_eq!(
            names,
            vec![
                "IdentityRegistered",
                "IdentityDeactivated",
                "IdentityReactivated"
            ]
        );
    }

    #[test]
    fn test_reregistration_gets_a_fresh_identity() {
        let registry = Registry::open();
        registry.service.set_deactivation_cooldown(ADMIN, 0).unwrap();
        let first = registry
            .service
            .register(ALICE, request("alice", [0x5A; 20]))
            .unwrap();
        registry.service.deactivate(ALICE).unwrap();
        registry.service.withdraw_stake(ALICE).unwrap();

        let registry = registry.restart();
        let second = registry
            .service
            .register(ALICE, request("alice", [0x5A; 20]))
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(registry.service.identity_of(&ALICE), Some(second));
        assert!(!registry.service.is_active(&first));
        assert!(registry.service.is_active(&second));
    }

    #[test]
    fn test_vouches_and_conservation_across_restart() {
        let registry = Registry::open();
        let before = registry.circulating();
        let alice = registry
            .service
            .register(ALICE, request("alice", [0x5A; 20]))
            .unwrap();
        registry.service.vouch(BOB, alice, 300).unwrap();
        registry.service.vouch(CAROL, alice, 200).unwrap();

        let registry = registry.restart();
        assert_eq!(registry.service.get_vouch_count(&alice), 2);
        assert_eq!(
            registry
                .service
                .get_identity(&alice)
                .unwrap()
                .total_vouches_received,
            500
        );

        registry.service.withdraw_vouch(BOB, alice).unwrap();
        assert_eq!(registry.service.get_vouch_count(&alice), 1);
        assert_eq!(registry.tokens.balance_of(&BOB), FUNDING);

        let report = registry.service.audit_custody();
        assert!(report.is_balanced());
        assert_eq!(report.custodied, MIN_STAKE + 200);
        assert_eq!(registry.circulating(), before);
    }
}
