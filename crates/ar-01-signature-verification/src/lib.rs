//! # Signature Verification Subsystem (AR-01)
//!
//! Recovers and checks secp256k1 signatures for the Agent Registry.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): hashing and signer recovery, no I/O
//! - **Ports Layer** (`ports/`): Trait definition for the inbound API
//! - **Service Layer** (`service.rs`): Wires domain logic to the port
//!
//! ## Signed Digests
//!
//! Registry signatures are never produced over a raw 32-byte digest. The
//! digest is first wrapped as `"\x19Ethereum Signed Message:\n32" || digest`
//! and hashed with keccak-256, so a signature over a registry message can
//! never be replayed as a raw transaction signature.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: Signatures with high S values are rejected
//! - **Scalar Range Validation**: R and S must be in [1, n-1]

pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use domain::ecdsa::{recover_signed_digest_signer, recover_signer, verify_signer};
pub use domain::entities::{EcdsaSignature, ECDSA_SIGNATURE_LEN};
pub use domain::errors::SignatureError;
pub use domain::hashing::{address_from_pubkey, keccak256, signed_digest, PERSONAL_MESSAGE_PREFIX};
pub use ports::inbound::SignatureVerificationApi;
pub use service::SignatureVerificationService;

#[cfg(any(test, feature = "test-helpers"))]
pub use domain::ecdsa::test_helpers;
