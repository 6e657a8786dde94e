//! # Integration Test Flows
//!
//! Exercises the registry crates together: the ECDSA verifier from AR-01,
//! the snapshot-backed ledger and service from AR-02, and the node's
//! JSON-lines host.

pub mod lifecycle;
pub mod node;
pub mod signatures;

#[cfg(test)]
pub(crate) mod fixtures {
    use ar_02_identity_registry::domain::DEFAULT_MIN_STAKE;
    use ar_02_identity_registry::{
        EcdsaSignatureVerifier, IdentityRegistryService, InMemoryLedgerStore, InMemoryTokenLedger,
        ManualClock, RegistryConfig, RegistryDependencies, RegistrationRequest,
    };
    use shared_types::{Address, Amount, Timestamp};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;

    pub const ADMIN: Address = [0xAD; 20];
    pub const ALICE: Address = [0xA1; 20];
    pub const BOB: Address = [0xB0; 20];
    pub const CAROL: Address = [0xC0; 20];
    pub const MIN_STAKE: Amount = DEFAULT_MIN_STAKE;
    pub const FUNDING: Amount = 10_000_000;
    pub const START: Timestamp = 1_700_000_000;

    pub type Service =
        IdentityRegistryService<InMemoryLedgerStore, InMemoryTokenLedger, EcdsaSignatureVerifier>;

    /// A registry persisted to a temporary directory.
    ///
    /// The token ledger and clock outlive restarts, as an external token
    /// contract and wall clock would.
    pub struct Registry {
        pub dir: TempDir,
        pub tokens: Arc<InMemoryTokenLedger>,
        pub clock: ManualClock,
        pub config: RegistryConfig,
        pub service: Service,
    }

    impl Registry {
        pub fn open() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let tokens = Arc::new(InMemoryTokenLedger::with_allocations([
                (ALICE, FUNDING),
                (BOB, FUNDING),
                (CAROL, FUNDING),
            ]));
            let clock = ManualClock::new(START);
            let config = RegistryConfig::with_admin(ADMIN);
            let service = build(&ledger_path(&dir), &tokens, &clock, &config);
            Self {
                dir,
                tokens,
                clock,
                config,
                service,
            }
        }

        /// Drop the service and reopen the ledger from its snapshot.
        pub fn restart(self) -> Self {
            let Registry {
                dir,
                tokens,
                clock,
                config,
                service,
            } = self;
            drop(service);
            let service = build(&ledger_path(&dir), &tokens, &clock, &config);
            Self {
                dir,
                tokens,
                clock,
                config,
                service,
            }
        }

        /// Tokens held by the test principals plus the custody account.
        pub fn circulating(&self) -> Amount {
            [ALICE, BOB, CAROL]
                .iter()
                .map(|holder| self.tokens.balance_of(holder))
                .sum::<Amount>()
                + self.tokens.custody_balance()
        }
    }

    fn ledger_path(dir: &TempDir) -> PathBuf {
        dir.path().join("ledger.bin")
    }

    fn build(
        path: &Path,
        tokens: &Arc<InMemoryTokenLedger>,
        clock: &ManualClock,
        config: &RegistryConfig,
    ) -> Service {
        let store = InMemoryLedgerStore::open(path, config.initial_params()).unwrap();
        IdentityRegistryService::new(RegistryDependencies {
            store: Arc::new(store),
            tokens: Arc::clone(tokens),
            sig_verifier: Arc::new(EcdsaSignatureVerifier::new()),
            config: config.clone(),
        })
        .with_time_source(Box::new(clock.clone()))
    }

    pub fn request(name: &str, signing_key: Address) -> RegistrationRequest {
        RegistrationRequest {
            name: name.to_string(),
            metadata_pointer: format!("ipfs://agents/{name}"),
            signing_key,
            stake_amount: MIN_STAKE,
        }
    }
}
