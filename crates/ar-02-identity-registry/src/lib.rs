//! # Identity Registry Subsystem (AR-02)
//!
//! A ledger of agent identities backed by staked tokens and social vouching.
//!
//! ## Architecture
//!
//! ```text
//! caller ──→ IdentityRegistryApi ──→ IdentityRegistryService
//!                                        │
//!          ┌──────────────┬──────────────┼──────────────┐
//!          ↓              ↓              ↓              ↓
//!    [LedgerStore]  [TokenGateway]  [SignatureVerifier] [TimeSource]
//! ```
//!
//! - **Domain** (`domain/`): lifecycle, vouching and custody rules as pure functions
//! - **Ports** (`ports/`): the inbound API and the outbound store/token/signature/time traits
//! - **Adapters** (`adapters/`): in-memory store with bincode snapshots, token ledger,
//!   manual clock, ECDSA verifier
//! - **Service** (`service/`): serializes mutations and commits each as one batch
//!
//! ## Identity Lifecycle
//!
//! ```text
//! register → Active ⇄ Deactivating → (cooldown) → Withdrawn
//! ```
//!
//! Withdrawal releases the stake and frees the owner slot. The record itself
//! is kept so signatures made with it stay verifiable.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ar_02_identity_registry::*;
//! use std::sync::Arc;
//!
//! let config = RegistryConfig::with_admin(admin);
//! let service = IdentityRegistryService::new(RegistryDependencies {
//!     store: Arc::new(InMemoryLedgerStore::new(config.initial_params())),
//!     tokens: Arc::new(InMemoryTokenLedger::with_allocations([(owner, 5_000_000)])),
//!     sig_verifier: Arc::new(EcdsaSignatureVerifier::new()),
//!     config,
//! });
//!
//! let key = service.register(owner, request)?;
//! assert!(service.verify_signature(&key, &digest, &signature));
//! ```

pub mod adapters;
pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{EcdsaSignatureVerifier, InMemoryLedgerStore, InMemoryTokenLedger, ManualClock};
pub use domain::{
    CustodyReport, ErrorKind, Identity, IdentityKey, IdentityStatus, RegistrationRequest,
    RegistryConfig, RegistryError, RegistryParams, RegistryResult, SignatureCheck, StoreError,
    TransferError, Vouch, VouchSlot,
};
pub use events::{EventRecord, RegistryEvent};
pub use ports::{
    IdentityRegistryApi, LedgerBatch, LedgerStore, LedgerWrite, SignatureVerifier,
    SystemTimeSource, TimeSource, TokenGateway,
};
pub use service::{IdentityRegistryService, RegistryDependencies};
