//! In-memory token ledger
//!
//! Models an ERC-20 style token from the registry's side: principals hold
//! balances and approve the registry as spender; `deposit` is `transferFrom`
//! into custody and `release` is `transfer` out of it.
//!
//! An opened ledger rewrites its snapshot (`[MAGIC][bincode(TokenState)]`)
//! after every change, before the change becomes visible. Genesis allocations
//! only seed a ledger whose file does not exist yet.

use super::snapshot;
use crate::domain::{StoreError, TransferError};
use crate::ports::TokenGateway;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, trace};

/// Magic bytes for token ledger snapshots
const TOKEN_MAGIC: &[u8; 8] = b"ARTOKEN\x01";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct TokenState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<Address, Amount>,
    custody: Amount,
}

impl TokenState {
    /// Balances from `allocations`, each fully approved for the registry.
    fn seeded<I>(allocations: I) -> Self
    where
        I: IntoIterator<Item = (Address, Amount)>,
    {
        let mut state = Self::default();
        for (holder, amount) in allocations {
            let balance = state.balances.entry(holder).or_default();
            *balance = balance.saturating_add(amount);
            state.allowances.insert(holder, *balance);
        }
        state
    }

    /// Every token in existence: holder balances plus custody.
    fn supply(&self) -> Amount {
        self.balances
            .values()
            .fold(self.custody, |total, balance| total.saturating_add(*balance))
    }
}

/// In-memory [`TokenGateway`].
#[derive(Debug, Default)]
pub struct InMemoryTokenLedger {
    state: RwLock<TokenState>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger with initial balances, each fully approved for the registry.
    pub fn with_allocations<I>(allocations: I) -> Self
    where
        I: IntoIterator<Item = (Address, Amount)>,
    {
        Self {
            state: RwLock::new(TokenState::seeded(allocations)),
            snapshot_path: None,
        }
    }

    /// Open a ledger persisted at `path`.
    ///
    /// An existing file wins and `genesis` is ignored; otherwise the ledger
    /// starts from `genesis` and the file is written immediately.
    pub fn open<I>(path: impl AsRef<Path>, genesis: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (Address, Amount)>,
    {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let state: TokenState = snapshot::read(TOKEN_MAGIC, &path)?;
            info!(
                path = %path.display(),
                holders = state.balances.len(),
                custody = %state.custody,
                "Loaded token ledger"
            );
            state
        } else {
            let state = TokenState::seeded(genesis);
            snapshot::write_atomic(&path, &snapshot::encode(TOKEN_MAGIC, &state)?)?;
            info!(
                path = %path.display(),
                holders = state.balances.len(),
                supply = %state.supply(),
                "Seeded token ledger from genesis"
            );
            state
        };

        Ok(Self {
            state: RwLock::new(state),
            snapshot_path: Some(path),
        })
    }

    /// Run `change` under the write lock and persist the result. On a failed
    /// persist the previous state is restored.
    fn update<R>(
        &self,
        change: impl FnOnce(&mut TokenState) -> Result<R, TransferError>,
    ) -> Result<R, TransferError> {
        let mut state = self.state.write();
        let Some(path) = &self.snapshot_path else {
            return change(&mut state);
        };

        let previous = state.clone();
        let out = change(&mut state)?;
        let written = snapshot::encode(TOKEN_MAGIC, &*state)
            .and_then(|bytes| snapshot::write_atomic(path, &bytes));
        if let Err(e) = written {
            *state = previous;
            return Err(TransferError::Rejected(format!("token ledger not persisted: {e}")));
        }
        Ok(out)
    }

    /// Credit new tokens to `holder`. Saturates at `Amount::MAX`.
    pub fn mint(&self, holder: Address, amount: Amount) -> Result<(), TransferError> {
        self.update(|state| {
            let balance = state.balances.entry(holder).or_default();
            *balance = balance.saturating_add(amount);
            Ok(())
        })
    }

    /// Set how much the registry may pull from `holder`.
    pub fn approve(&self, holder: Address, amount: Amount) -> Result<(), TransferError> {
        self.update(|state| {
            state.allowances.insert(holder, amount);
            Ok(())
        })
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.state
            .read()
            .balances
            .get(holder)
            .copied()
            .unwrap_or(0)
    }

    pub fn allowance_of(&self, holder: &Address) -> Amount {
        self.state
            .read()
            .allowances
            .get(holder)
            .copied()
            .unwrap_or(0)
    }

    /// Balance currently held by the registry.
    pub fn custody_balance(&self) -> Amount {
        self.state.read().custody
    }

    /// Sum of all balances and custody.
    pub fn total_supply(&self) -> Amount {
        self.state.read().supply()
    }
}

impl TokenGateway for InMemoryTokenLedger {
    fn deposit(&self, from: &Address, amount: Amount) -> Result<(), TransferError> {
        self.update(|state| {
            let approved = state.allowances.get(from).copied().unwrap_or(0);
            if approved < amount {
                return Err(TransferError::InsufficientAllowance {
                    required: amount,
                    approved,
                });
            }
            let available = state.balances.get(from).copied().unwrap_or(0);
            if available < amount {
                return Err(TransferError::InsufficientBalance {
                    required: amount,
                    available,
                });
            }
            let custody = state
                .custody
                .checked_add(amount)
                .ok_or_else(|| TransferError::Rejected("custody overflow".to_string()))?;

            state.allowances.insert(*from, approved - amount);
            state.balances.insert(*from, available - amount);
            state.custody = custody;
            trace!(amount = %amount, custody = %custody, "Deposited into custody");
            Ok(())
        })
    }

    fn release(&self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        self.update(|state| {
            let held = state.custody;
            if held < amount {
                return Err(TransferError::InsufficientCustody {
                    required: amount,
                    held,
                });
            }
            let balance = state.balances.get(to).copied().unwrap_or(0);
            let credited = balance.checked_add(amount).ok_or_else(|| {
                TransferError::Rejected("recipient balance overflow".to_string())
            })?;

            state.custody = held - amount;
            state.balances.insert(*to, credited);
            trace!(amount = %amount, custody = %(held - amount), "Released from custody");
            Ok(())
        })
    }
}
