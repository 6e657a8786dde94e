//! # Signature Verification Through the Registry
//!
//! Real secp256k1 keys sign registry digests with the personal-message
//! prefix; the registry must accept them only against the identity's
//! current signing key.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use ar_01_signature_verification::test_helpers::{address_of, generate_keypair, sign, sign_digest};
    use ar_01_signature_verification::{keccak256, ECDSA_SIGNATURE_LEN};
    use ar_02_identity_registry::{IdentityKey, IdentityRegistryApi, SignatureCheck};

    #[test]
    fn test_agent_signs_with_registered_key() {
        let registry = Registry::open();
        let (agent_key, _) = generate_keypair();
        let identity = registry
            .service
            .register(ALICE, request("alice", address_of(&agent_key)))
            .unwrap();

        let digest = keccak256(b"task #42 completed");
        let signature = sign_digest(&digest, &agent_key).to_bytes();
        assert!(registry.service.verify_signature(&identity, &digest, &signature));
        assert_eq!(
            registry
                .service
                .verify_signature_detailed(&identity, &digest, &signature),
            SignatureCheck::Valid
        );
    }

    #[test]
    fn test_raw_digest_signature_is_rejected() {
        let registry = Registry::open();
        let (agent_key, _) = generate_keypair();
        let identity = registry
            .service
            .register(ALICE, request("alice", address_of(&agent_key)))
            .unwrap();

        // Signed without the personal-message prefix.
        let digest = keccak256(b"task #42 completed");
        let signature = sign(&digest, &agent_key).to_bytes();
        assert!(!registry.service.verify_signature(&identity, &digest, &signature));
        assert!(matches!(
            registry
                .service
                .verify_signature_detailed(&identity, &digest, &signature),
            SignatureCheck::SignerMismatch { .. }
        ));
    }

    #[test]
    fn test_signature_from_other_identity_key() {
        let registry = Registry::open();
        let (alice_key, _) = generate_keypair();
        let (bob_key, _) = generate_keypair();
        let alice = registry
            .service
            .register(ALICE, request("alice", address_of(&alice_key)))
            .unwrap();
        let bob = registry
            .service
            .register(BOB, request("bob", address_of(&bob_key)))
            .unwrap();

        let digest = keccak256(b"hello");
        let bob_signature = sign_digest(&digest, &bob_key).to_bytes();
        assert!(registry.service.verify_signature(&bob, &digest, &bob_signature));
        assert_eq!(
            registry
                .service
                .verify_signature_detailed(&alice, &digest, &bob_signature),
            SignatureCheck::SignerMismatch {
                recovered: address_of(&bob_key)
            }
        );
    }

    #[test]
    fn test_rotation_survives_restart() {
        let registry = Registry::open();
        let (old_key, _) = generate_keypair();
        let (new_key, _) = generate_keypair();
        let identity = registry
            .service
            .register(ALICE, request("alice", address_of(&old_key)))
            .unwrap();
        registry
            .service
            .update_signing_key(ALICE, address_of(&new_key))
            .unwrap();

        let registry = registry.restart();
        let digest = keccak256(b"after restart");
        assert!(!registry.service.verify_signature(
            &identity,
            &digest,
            &sign_digest(&digest, &old_key).to_bytes()
        ));
        assert!(registry.service.verify_signature(
            &identity,
            &digest,
            &sign_digest(&digest, &new_key).to_bytes()
        ));
    }

    #[test]
    fn test_deactivating_identity_still_verifies() {
        let registry = Registry::open();
        let (agent_key, _) = generate_keypair();
        let identity = registry
            .service
            .register(ALICE, request("alice", address_of(&agent_key)))
            .unwrap();
        registry.service.deactivate(ALICE).unwrap();

        let digest = keccak256(b"signed while winding down");
        let signature = sign_digest(&digest, &agent_key).to_bytes();
        assert!(!registry.service.is_active(&identity));
        assert!(registry.service.verify_signature(&identity, &digest, &signature));
    }

    #[test]
    fn test_malformed_and_unknown_inputs() {
        let registry = Registry::open();
        let (agent_key, _) = generate_keypair();
        let identity = registry
            .service
            .register(ALICE, request("alice", address_of(&agent_key)))
            .unwrap();
        let digest = keccak256(b"payload");
        let signature = sign_digest(&digest, &agent_key).to_bytes();

        let truncated = &signature[..ECDSA_SIGNATURE_LEN - 1];
        assert_eq!(
            registry
                .service
                .verify_signature_detailed(&identity, &digest, truncated),
            SignatureCheck::Malformed
        );

        let mut bad_v = signature;
        bad_v[ECDSA_SIGNATURE_LEN - 1] = 99;
        assert!(!registry.service.verify_signature(&identity, &digest, &bad_v));

        let zeroed = [0u8; ECDSA_SIGNATURE_LEN];
        assert!(!registry.service.verify_signature(&identity, &digest, &zeroed));

        let unknown = IdentityKey([0x77; 32]);
        assert_eq!(
            registry
                .service
                .verify_signature_detailed(&unknown, &digest, &signature),
            SignatureCheck::IdentityNotFound
        );
    }
}
