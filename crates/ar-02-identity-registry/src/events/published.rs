//! Published registry events

use crate::domain::IdentityKey;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, Timestamp};

/// A state change committed by the registry.
///
/// Externally tagged so the same type round-trips through JSON and the
/// bincode snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    IdentityRegistered {
        identity_key: IdentityKey,
        #[serde(with = "shared_types::hex_bytes")]
        owner: Address,
        #[serde(with = "shared_types::hex_bytes")]
        signing_key: Address,
        name: String,
        stake: Amount,
    },
    PlatformLinked {
        identity_key: IdentityKey,
        platform: String,
    },
    SigningKeyUpdated {
        identity_key: IdentityKey,
        #[serde(with = "shared_types::hex_bytes")]
        previous: Address,
        #[serde(with = "shared_types::hex_bytes")]
        current: Address,
    },
    IdentityDeactivated {
        identity_key: IdentityKey,
        deactivated_at: Timestamp,
    },
    IdentityReactivated {
        identity_key: IdentityKey,
    },
    StakeWithdrawn {
        identity_key: IdentityKey,
        #[serde(with = "shared_types::hex_bytes")]
        owner: Address,
        amount: Amount,
    },
    Vouched {
        identity_key: IdentityKey,
        #[serde(with = "shared_types::hex_bytes")]
        voucher: Address,
        amount: Amount,
    },
    VouchWithdrawn {
        identity_key: IdentityKey,
        #[serde(with = "shared_types::hex_bytes")]
        voucher: Address,
        amount: Amount,
    },
    MinStakeUpdated {
        previous: Amount,
        current: Amount,
    },
    DeactivationCooldownUpdated {
        previous: u64,
        current: u64,
    },
}

impl RegistryEvent {
    /// Stable event name, used as the log/wire label.
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::IdentityRegistered { .. } => "IdentityRegistered",
            RegistryEvent::PlatformLinked { .. } => "PlatformLinked",
            RegistryEvent::SigningKeyUpdated { .. } => "SigningKeyUpdated",
            RegistryEvent::IdentityDeactivated { .. } => "IdentityDeactivated",
            RegistryEvent::IdentityReactivated { .. } => "IdentityReactivated",
            RegistryEvent::StakeWithdrawn { .. } => "StakeWithdrawn",
            RegistryEvent::Vouched { .. } => "Vouched",
            RegistryEvent::VouchWithdrawn { .. } => "VouchWithdrawn",
            RegistryEvent::MinStakeUpdated { .. } => "MinStakeUpdated",
            RegistryEvent::DeactivationCooldownUpdated { .. } => "DeactivationCooldownUpdated",
        }
    }

    /// Identity the event concerns, if any.
    pub fn identity_key(&self) -> Option<IdentityKey> {
        match self {
            RegistryEvent::IdentityRegistered { identity_key, .. }
            | RegistryEvent::PlatformLinked { identity_key, .. }
            | RegistryEvent::SigningKeyUpdated { identity_key, .. }
            | RegistryEvent::IdentityDeactivated { identity_key, .. }
            | RegistryEvent::IdentityReactivated { identity_key }
            | RegistryEvent::StakeWithdrawn { identity_key, .. }
            | RegistryEvent::Vouched { identity_key, .. }
            | RegistryEvent::VouchWithdrawn { identity_key, .. } => Some(*identity_key),
            RegistryEvent::MinStakeUpdated { .. }
            | RegistryEvent::DeactivationCooldownUpdated { .. } => None,
        }
    }
}

/// One entry of the durable event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Strictly increasing, starting at 1.
    pub sequence: u64,
    pub timestamp: Timestamp,
    pub event: RegistryEvent,
}
