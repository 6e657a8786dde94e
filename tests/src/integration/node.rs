//! # JSON-Lines Sessions
//!
//! Drives [`registry_node::RegistryNode`] one protocol line at a time, the
//! way the binary does with stdin/stdout.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{ADMIN, ALICE, BOB, MIN_STAKE, START};
    use ar_01_signature_verification::keccak256;
    use ar_01_signature_verification::test_helpers::{address_of, generate_keypair, sign_digest};
    use ar_02_identity_registry::domain::DEFAULT_DEACTIVATION_COOLDOWN_SECS;
    use ar_02_identity_registry::ManualClock;
    use registry_node::{NodeConfig, RegistryNode};
    use serde_json::{json, Value};
    use shared_types::to_hex;

    struct Session {
        node: RegistryNode,
    }

    impl Session {
        fn send(&self, request: Value) -> Value {
            let line = self.node.handle_line(&request.to_string());
            serde_json::from_str(&line).unwrap()
        }

        fn ok(&self, request: Value) -> Value {
            let reply = self.send(request);
            assert!(reply.get("error").is_none(), "unexpected error: {reply}");
            reply["ok"].clone()
        }
    }

    fn config() -> NodeConfig {
        let mut config = NodeConfig::default();
        config.registry.admin = ADMIN;
        config.genesis_allocations = vec![(ALICE, 5_000_000), (BOB, 5_000_000)];
        config
    }

    fn session(clock: &ManualClock) -> Session {
        let node = RegistryNode::new(&config())
            .unwrap()
            .with_time_source(Box::new(clock.clone()));
        Session { node }
    }

    #[test]
    fn test_full_agent_session() {
        let clock = ManualClock::new(START);
        let session = session(&clock);
        let (agent_key, _) = generate_keypair();

        let identity_key = session.ok(json!({"register": {
            "caller": to_hex(&ALICE),
            "name": "alice",
            "metadata_pointer": "ipfs://agents/alice",
            "signing_key": to_hex(&address_of(&agent_key)),
            "stake_amount": MIN_STAKE as u64,
        }}));
        let identity_key = identity_key.as_str().unwrap().to_string();

        session.ok(json!({"link_platform": {"caller": to_hex(&ALICE), "platform": "discord:alice"}}));
        session.ok(json!({"vouch": {"caller": to_hex(&BOB), "identity_key": identity_key, "amount": 250}}));

        let identity = session.ok(json!({"get_identity": {"identity_key": identity_key}}));
        assert_eq!(identity["name"], "alice");
        assert_eq!(identity["staked_amount"], MIN_STAKE as u64);
        assert_eq!(identity["total_vouches_received"], 250);
        assert_eq!(identity["owner"], to_hex(&ALICE));

        assert_eq!(
            session.ok(json!({"get_vouch_count": {"identity_key": identity_key}})),
            1
        );
        assert_eq!(
            session.ok(json!({"get_linked_platforms": {"identity_key": identity_key}})),
            json!(["discord:alice"])
        );
        assert_eq!(
            session.ok(json!({"identity_of": {"owner": to_hex(&ALICE)}})),
            json!(identity_key)
        );

        let digest = keccak256(b"hello from alice's agent");
        let signature = sign_digest(&digest, &agent_key).to_bytes();
        let report = session.ok(json!({"verify_signature": {
            "identity_key": identity_key,
            "digest": to_hex(&digest),
            "signature": to_hex(&signature),
        }}));
        assert_eq!(report["valid"], true);
        assert_eq!(report["outcome"], "valid");

        let custody = session.ok(json!("audit_custody"));
        assert_eq!(custody["custodied"], MIN_STAKE as u64 + 250);
        assert_eq!(custody["inconsistent_identities"], json!([]));
    }

    #[test]
    fn test_withdrawal_through_protocol() {
        let clock = ManualClock::new(START);
        let session = session(&clock);

        session.ok(json!({"register": {
            "caller": to_hex(&ALICE),
            "name": "alice",
            "signing_key": to_hex(&[0x5A; 20]),
            "stake_amount": MIN_STAKE as u64,
        }}));
        session.ok(json!({"deactivate": {"caller": to_hex(&ALICE)}}));

        let early = session.send(json!({"withdraw_stake": {"caller": to_hex(&ALICE)}}));
        assert_eq!(early["error"]["kind"], "TimingViolation");

        clock.advance(DEFAULT_DEACTIVATION_COOLDOWN_SECS);
        assert_eq!(
            session.ok(json!({"withdraw_stake": {"caller": to_hex(&ALICE)}})),
            MIN_STAKE as u64
        );
        assert_eq!(
            session.ok(json!({"balance_of": {"holder": to_hex(&ALICE)}})),
            5_000_000
        );

        let events = session.ok(json!({"events_since": {"after": 1}}));
        let events = events.as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["sequence"], 2);
        assert!(events[0]["event"].get("IdentityDeactivated").is_some());
        assert!(events[1]["event"].get("StakeWithdrawn").is_some());
    }

    #[test]
    fn test_admin_commands() {
        let clock = ManualClock::new(START);
        let session = session(&clock);

        let denied = session.send(json!({"set_min_stake": {"caller": to_hex(&ALICE), "amount": 5}}));
        assert_eq!(denied["error"]["kind"], "PreconditionViolation");

        session.ok(json!({"set_min_stake": {"caller": to_hex(&ADMIN), "amount": 2_000_000}}));
        session.ok(json!({"set_deactivation_cooldown": {"caller": to_hex(&ADMIN), "seconds": 3600}}));
        let params = session.ok(json!("params"));
        assert_eq!(params["min_stake"], 2_000_000);
        assert_eq!(params["deactivation_cooldown_secs"], 3600);

        let low = session.send(json!({"register": {
            "caller": to_hex(&ALICE),
            "name": "alice",
            "signing_key": to_hex(&[0x5A; 20]),
            "stake_amount": MIN_STAKE as u64,
        }}));
        assert_eq!(low["error"]["kind"], "PreconditionViolation");
    }

    #[test]
    fn test_transfer_failures_are_reported() {
        let clock = ManualClock::new(START);
        let session = session(&clock);

        let reply = session.send(json!({"register": {
            "caller": to_hex(&ALICE),
            "name": "alice",
            "signing_key": to_hex(&[0x5A; 20]),
            "stake_amount": 9_000_000u64,
        }}));
        assert_eq!(reply["error"]["kind"], "FundsTransferFailure");
        assert_eq!(
            session.ok(json!({"identity_of": {"owner": to_hex(&ALICE)}})),
            Value::Null
        );
    }

    #[test]
    fn test_bad_requests_do_not_touch_state() {
        let clock = ManualClock::new(START);
        let session = session(&clock);

        for line in [
            "",
            "{}",
            r#"{"register":{"caller":"0x1234"}}"#,
            r#"{"verify_signature":{"identity_key":"0x00","digest":"0x00","signature":"zz"}}"#,
            r#"{"launch_rockets":{}}"#,
        ] {
            let reply: Value = serde_json::from_str(&session.node.handle_line(line)).unwrap();
            assert_eq!(reply["error"]["kind"], "InvalidRequest", "line: {line}");
        }
        assert_eq!(session.ok(json!({"events_since": {}})), json!([]));
    }
}
