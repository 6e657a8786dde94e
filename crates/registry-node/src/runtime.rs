//! # Registry Node Runtime
//!
//! Builds the registry service from [`NodeConfig`] and answers protocol lines.
//!
//! ## Startup Sequence
//!
//! 1. Validate the registry thresholds
//! 2. Open the ledger and the token ledger (files in `data_dir` when set,
//!    volatile otherwise); genesis allocations seed a token ledger only when
//!    its file does not exist yet
//! 3. Compare token custody with the ledger's custodied total
//! 4. Serve commands

use crate::commands::{dispatch, Command, ErrorReply, Reply, Response};
use crate::config::NodeConfig;
use ar_02_identity_registry::{
    EcdsaSignatureVerifier, IdentityRegistryApi, IdentityRegistryService, InMemoryLedgerStore,
    InMemoryTokenLedger, LedgerStore, RegistryDependencies, RegistryError, StoreError,
    TimeSource,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Concrete service type hosted by the node.
pub type NodeService =
    IdentityRegistryService<InMemoryLedgerStore, InMemoryTokenLedger, EcdsaSignatureVerifier>;

/// Node startup errors.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Invalid registry configuration: {0}")]
    Config(#[from] RegistryError),

    #[error("Failed to prepare data directory: {0}")]
    DataDir(#[from] std::io::Error),

    #[error("Failed to open ledger: {0}")]
    Store(#[from] StoreError),

    #[error("Ledger holds state but token ledger {0} is missing")]
    MissingTokenLedger(PathBuf),
}

/// The running registry node.
pub struct RegistryNode {
    service: NodeService,
    tokens: Arc<InMemoryTokenLedger>,
}

impl RegistryNode {
    /// Create a new node from configuration.
    pub fn new(config: &NodeConfig) -> Result<Self, NodeError> {
        config.registry.validate()?;

        let params = config.registry.initial_params();
        let genesis = config.genesis_allocations.iter().copied();
        let (store, tokens) = match (config.ledger_path(), config.token_path()) {
            (Some(ledger_path), Some(token_path)) => {
                if let Some(dir) = ledger_path.parent() {
                    std::fs::create_dir_all(dir)?;
                }
                let store = InMemoryLedgerStore::open(&ledger_path, params)?;
                // Re-seeding genesis next to a used ledger would mint tokens
                if store.last_event_sequence() > 0 && !token_path.exists() {
                    return Err(NodeError::MissingTokenLedger(token_path));
                }
                let tokens = InMemoryTokenLedger::open(&token_path, genesis)?;
                (store, tokens)
            }
            _ => {
                warn!("AR_DATA_DIR not set, ledger state will not survive restart");
                (
                    InMemoryLedgerStore::new(params),
                    InMemoryTokenLedger::with_allocations(genesis),
                )
            }
        };

        let custody = tokens.custody_balance();
        let custodied = store.custodied();
        if custody != custodied {
            warn!(
                custody = %custody,
                custodied = %custodied,
                "Token custody differs from ledger, see audit_custody"
            );
        }

        let tokens = Arc::new(tokens);
        let service = IdentityRegistryService::new(RegistryDependencies {
            store: Arc::new(store),
            tokens: Arc::clone(&tokens),
            sig_verifier: Arc::new(EcdsaSignatureVerifier::new()),
            config: config.registry.clone(),
        });

        info!(
            min_stake = %service.params().min_stake,
            cooldown_secs = service.params().deactivation_cooldown_secs,
            supply = %tokens.total_supply(),
            "Registry node ready"
        );
        Ok(Self { service, tokens })
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.service = self.service.with_time_source(time_source);
        self
    }

    pub fn service(&self) -> &NodeService {
        &self.service
    }

    pub fn tokens(&self) -> &InMemoryTokenLedger {
        &self.tokens
    }

    /// Execute one command.
    pub fn execute(&self, command: Command) -> Response {
        match command {
            Command::BalanceOf { holder } => {
                Response::Ok(Reply::Amount(self.tokens.balance_of(&holder)))
            }
            other => dispatch(&self.service, other),
        }
    }

    /// Parse, execute and encode one protocol line.
    pub fn handle_line(&self, line: &str) -> String {
        let response = match serde_json::from_str::<Command>(line) {
            Ok(command) => {
                debug!(?command, "Executing command");
                self.execute(command)
            }
            Err(e) => Response::Error(ErrorReply::invalid_request(e.to_string())),
        };
        serde_json::to_string(&response).unwrap_or_else(|e| internal_error_line(&e.to_string()))
    }
}

/// Error line for a response that could not be encoded.
fn internal_error_line(message: &str) -> String {
    json!({"error": {"kind": "Internal", "message": message}}).to_string()
}
