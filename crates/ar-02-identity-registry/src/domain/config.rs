//! Registry configuration

use super::{RegistryError, RegistryParams};
use shared_types::{is_zero_address, Address, Amount, SECONDS_PER_DAY, ZERO_ADDRESS};

/// Default minimum stake for registration (base units).
pub const DEFAULT_MIN_STAKE: Amount = 1_000_000;

/// Default deactivation cooldown: 7 days.
pub const DEFAULT_DEACTIVATION_COOLDOWN_SECS: u64 = 7 * SECONDS_PER_DAY;

/// Registry configuration.
///
/// `min_stake` and `deactivation_cooldown_secs` seed the persisted
/// [`RegistryParams`] the first time a store is opened; afterwards only the
/// administrator changes them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Principal allowed to call administrative operations.
    pub admin: Address,
    pub min_stake: Amount,
    pub deactivation_cooldown_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            admin: ZERO_ADDRESS,
            min_stake: DEFAULT_MIN_STAKE,
            deactivation_cooldown_secs: DEFAULT_DEACTIVATION_COOLDOWN_SECS,
        }
    }
}

impl RegistryConfig {
    /// Default thresholds with the given administrator.
    pub fn with_admin(admin: Address) -> Self {
        Self {
            admin,
            ..Self::default()
        }
    }

    /// Whether administrative operations can ever succeed.
    pub fn has_admin(&self) -> bool {
        !is_zero_address(&self.admin)
    }

    /// Reject thresholds that would let a zero stake register.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.min_stake == 0 {
            return Err(RegistryError::InvalidAmount);
        }
        Ok(())
    }

    pub fn initial_params(&self) -> RegistryParams {
        RegistryParams {
            min_stake: self.min_stake,
            deactivation_cooldown_secs: self.deactivation_cooldown_secs,
        }
    }
}
