//! # Node Configuration
//!
//! Environment variables:
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `AR_ADMIN` | administrator address (`0x` hex) | zero (no admin) |
//! | `AR_MIN_STAKE` | minimum registration stake | 1 000 000 |
//! | `AR_COOLDOWN_SECS` | deactivation cooldown | 604 800 |
//! | `AR_DATA_DIR` | directory for `ledger.bin` and `tokens.bin` | unset (volatile) |
//! | `AR_GENESIS_ALLOCATIONS` | `0xaddr:amount,...` token balances, first start only | empty |
//!
//! ## Security Requirements
//!
//! - `admin` MUST NOT be the zero address in production

use ar_02_identity_registry::{RegistryConfig, RegistryError};
use shared_types::{from_hex, Address, Amount};
use std::path::PathBuf;
use thiserror::Error;

/// Snapshot file name inside the data directory.
pub const LEDGER_FILE: &str = "ledger.bin";

/// Token ledger file name inside the data directory.
pub const TOKENS_FILE: &str = "tokens.bin";

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConfig {
    /// Registry thresholds and administrator.
    pub registry: RegistryConfig,
    /// Where the ledger snapshot lives. `None` keeps state in memory only.
    pub data_dir: Option<PathBuf>,
    /// Initial token balances, each fully approved for the registry. Only
    /// applied when the data directory holds no token ledger yet.
    pub genesis_allocations: Vec<(Address, Amount)>,
}

impl NodeConfig {
    /// Validate configuration for production readiness.
    ///
    /// # Returns
    ///
    /// Returns `Err` if:
    /// - the administrator is the zero address
    /// - the registry thresholds are invalid
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if !self.registry.has_admin() {
            return Err(ConfigError::MissingAdmin);
        }
        self.registry.validate()?;
        Ok(())
    }

    pub fn ledger_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(LEDGER_FILE))
    }

    pub fn token_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(TOKENS_FILE))
    }

    /// Build from a variable lookup. `load_config` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = NodeConfig::default();

        if let Some(admin) = lookup("AR_ADMIN") {
            config.registry.admin = parse_address("AR_ADMIN", &admin)?;
        }
        if let Some(min_stake) = lookup("AR_MIN_STAKE") {
            config.registry.min_stake = parse_number("AR_MIN_STAKE", &min_stake)?;
        }
        if let Some(cooldown) = lookup("AR_COOLDOWN_SECS") {
            config.registry.deactivation_cooldown_secs =
                parse_number("AR_COOLDOWN_SECS", &cooldown)?;
        }
        if let Some(dir) = lookup("AR_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(allocations) = lookup("AR_GENESIS_ALLOCATIONS") {
            config.genesis_allocations = parse_allocations(&allocations)?;
        }

        Ok(config)
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<NodeConfig, ConfigError> {
    NodeConfig::from_lookup(|key| std::env::var(key).ok())
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "SECURITY VIOLATION: administrator is the zero address. \
         Set AR_ADMIN to the registry administrator's address."
    )]
    MissingAdmin,

    #[error("{var}: invalid address {value:?}")]
    InvalidAddress { var: &'static str, value: String },

    #[error("{var}: invalid number {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("AR_GENESIS_ALLOCATIONS: invalid entry {0:?}, expected 0xaddress:amount")]
    InvalidAllocation(String),

    #[error("Invalid registry parameters: {0}")]
    Registry(#[from] RegistryError),
}

fn parse_address(var: &'static str, value: &str) -> Result<Address, ConfigError> {
    from_hex::<20>(value.trim()).map_err(|_| ConfigError::InvalidAddress {
        var,
        value: value.to_string(),
    })
}

fn parse_number<N: std::str::FromStr>(var: &'static str, value: &str) -> Result<N, ConfigError> {
    value
        .trim()
        .replace('_', "")
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        })
}

fn parse_allocations(value: &str) -> Result<Vec<(Address, Amount)>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (address, amount) = entry
                .split_once(':')
                .ok_or_else(|| ConfigError::InvalidAllocation(entry.to_string()))?;
            let address = from_hex::<20>(address.trim())
                .map_err(|_| ConfigError::InvalidAllocation(entry.to_string()))?;
            let amount = amount
                .trim()
                .parse::<Amount>()
                .map_err(|_| ConfigError::InvalidAllocation(entry.to_string()))?;
            Ok((address, amount))
        })
        .collect()
}
