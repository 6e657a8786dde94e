//! In-memory ledger store with optional journal persistence
//!
//! A persisted store keeps two files next to each other:
//!
//! - snapshot `<path>`: `[MAGIC (8 bytes)][bincode(LedgerState)]`
//! - journal `<path>.log`: `[LOG_MAGIC (8 bytes)]` then one frame per batch,
//!   `[batch number u64 LE][length u32 LE][bincode(Vec<LedgerWrite>)]`
//!
//! A commit validates the batch against the live state, appends and syncs its
//! journal frame, then applies the writes in place. Once the journal outgrows
//! the snapshot (and [`DEFAULT_COMPACTION_BYTES`]) the state is written as a
//! new snapshot and the journal is emptied, which keeps commit cost
//! proportional to the batch rather than to the ledger.
//!
//! The snapshot records how many batches it covers, so journal frames that a
//! crash left behind after a compaction are skipped on replay. A torn final
//! frame is dropped.

use super::snapshot::{self, io_error};
use crate::domain::{Identity, IdentityKey, RegistryParams, StoreError, Vouch, VouchSlot};
use crate::events::EventRecord;
use crate::ports::{LedgerBatch, LedgerStore, LedgerWrite};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Magic bytes for ledger snapshots
const LEDGER_MAGIC: &[u8; 8] = b"ARLEDGR\x02";

/// Magic bytes opening the journal
const LOG_MAGIC: &[u8; 8] = b"ARJRNL\x00\x01";

/// Batch number plus payload length.
const FRAME_HEADER_LEN: usize = 12;

/// Journal size below which no compaction happens.
pub const DEFAULT_COMPACTION_BYTES: u64 = 1 << 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct LedgerState {
    identities: BTreeMap<IdentityKey, Identity>,
    owners: HashMap<Address, IdentityKey>,
    platforms: HashMap<IdentityKey, Vec<String>>,
    vouches: HashMap<IdentityKey, Vec<Vouch>>,
    vouch_index: HashMap<(IdentityKey, Address), VouchSlot>,
    registration_nonce: u64,
    custodied: Amount,
    params: RegistryParams,
    events: Vec<EventRecord>,
    /// Batches applied so far; journal frame numbers continue from here.
    batches: u64,
}

impl LedgerState {
    fn new(params: RegistryParams) -> Self {
        Self {
            identities: BTreeMap::new(),
            owners: HashMap::new(),
            platforms: HashMap::new(),
            vouches: HashMap::new(),
            vouch_index: HashMap::new(),
            registration_nonce: 0,
            custodied: 0,
            params,
            events: Vec::new(),
            batches: 0,
        }
    }

    fn last_event_sequence(&self) -> u64 {
        self.events.last().map(|r| r.sequence).unwrap_or(0)
    }

    /// Check a whole batch against the current state plus the batch's own
    /// earlier writes. Nothing is modified.
    fn check(&self, writes: &[LedgerWrite]) -> Result<(), StoreError> {
        let mut new_identities = HashSet::new();
        // Vouchers of slots appended earlier in this batch, per identity
        let mut appended: HashMap<IdentityKey, Vec<Address>> = HashMap::new();
        let mut next_sequence = self.last_event_sequence() + 1;

        for write in writes {
            match write {
                LedgerWrite::PutIdentity(identity) => {
                    new_identities.insert(identity.identity_key);
                }
                LedgerWrite::IndexOwner { identity_key, .. } => {
                    if !self.identities.contains_key(identity_key)
                        && !new_identities.contains(identity_key)
                    {
                        return Err(StoreError::InvalidWrite(format!(
                            "owner index points at unknown identity {identity_key}"
                        )));
                    }
                }
                LedgerWrite::PutVouch {
                    identity_key,
                    slot: Some(VouchSlot(index)),
                    vouch,
                } => {
                    let stored = self.vouches.get(identity_key).map_or(&[][..], Vec::as_slice);
                    let holder = match stored.get(*index) {
                        Some(existing) => Some(existing.voucher),
                        None => appended
                            .get(identity_key)
                            .and_then(|pending| pending.get(*index - stored.len()))
                            .copied(),
                    };
                    match holder {
                        None => {
                            return Err(StoreError::InvalidWrite(format!(
                                "vouch slot {index} out of range on {identity_key}"
                            )))
                        }
                        Some(voucher) if voucher != vouch.voucher => {
                            return Err(StoreError::InvalidWrite(format!(
                                "vouch slot {index} on {identity_key} belongs to another voucher"
                            )))
                        }
                        Some(_) => {}
                    }
                }
                LedgerWrite::PutVouch {
                    identity_key,
                    slot: None,
                    vouch,
                } => {
                    let pending = appended.entry(*identity_key).or_default();
                    if self
                        .vouch_index
                        .contains_key(&(*identity_key, vouch.voucher))
                        || pending.contains(&vouch.voucher)
                    {
                        return Err(StoreError::InvalidWrite(format!(
                            "voucher already holds a slot on {identity_key}"
                        )));
                    }
                    pending.push(vouch.voucher);
                }
                LedgerWrite::AppendEvent(record) => {
                    if record.sequence != next_sequence {
                        return Err(StoreError::InvalidWrite(format!(
                            "event sequence {} does not follow {}",
                            record.sequence,
                            next_sequence - 1
                        )));
                    }
                    next_sequence += 1;
                }
                LedgerWrite::ClearOwner(_)
                | LedgerWrite::AppendPlatform { .. }
                | LedgerWrite::BumpRegistrationNonce
                | LedgerWrite::SetCustodied(_)
                | LedgerWrite::SetParams(_) => {}
            }
        }
        Ok(())
    }

    /// Apply a batch that passed [`LedgerState::check`].
    fn apply_all(&mut self, writes: Vec<LedgerWrite>) {
        for write in writes {
            self.apply(write);
        }
        self.batches += 1;
    }

    fn apply(&mut self, write: LedgerWrite) {
        match write {
            LedgerWrite::PutIdentity(identity) => {
                self.identities.insert(identity.identity_key, identity);
            }
            LedgerWrite::IndexOwner {
                owner,
                identity_key,
            } => {
                self.owners.insert(owner, identity_key);
            }
            LedgerWrite::ClearOwner(owner) => {
                self.owners.remove(&owner);
            }
            LedgerWrite::AppendPlatform {
                identity_key,
                platform,
            } => {
                self.platforms
                    .entry(identity_key)
                    .or_default()
                    .push(platform);
            }
            LedgerWrite::PutVouch {
                identity_key,
                slot,
                vouch,
            } => {
                let list = self.vouches.entry(identity_key).or_default();
                match slot {
                    Some(VouchSlot(index)) if index < list.len() => list[index] = vouch,
                    _ => {
                        self.vouch_index
                            .insert((identity_key, vouch.voucher), VouchSlot(list.len()));
                        list.push(vouch);
                    }
                }
            }
            LedgerWrite::BumpRegistrationNonce => {
                self.registration_nonce = self.registration_nonce.saturating_add(1);
            }
            LedgerWrite::SetCustodied(amount) => {
                self.custodied = amount;
            }
            LedgerWrite::SetParams(params) => {
                self.params = params;
            }
            LedgerWrite::AppendEvent(record) => {
                self.events.push(record);
            }
        }
    }

    /// Apply the journal frames in `data` that the state does not cover yet.
    ///
    /// Returns the length of the well-formed prefix; anything after it is a
    /// torn write.
    fn replay(&mut self, data: &[u8]) -> Result<usize, StoreError> {
        let mut offset = LOG_MAGIC.len();
        while data.len() - offset >= FRAME_HEADER_LEN {
            let header = &data[offset..offset + FRAME_HEADER_LEN];
            let mut number = [0u8; 8];
            number.copy_from_slice(&header[..8]);
            let mut length = [0u8; 4];
            length.copy_from_slice(&header[8..]);
            let number = u64::from_le_bytes(number);
            let length = u32::from_le_bytes(length) as usize;

            let body_start = offset + FRAME_HEADER_LEN;
            let Some(body) = data.get(body_start..body_start.saturating_add(length)) else {
                break;
            };
            let writes: Vec<LedgerWrite> = bincode::deserialize(body)
                .map_err(|e| StoreError::Corrupt(format!("journal batch {number}: {e}")))?;

            if number > self.batches {
                if number != self.batches + 1 {
                    return Err(StoreError::Corrupt(format!(
                        "journal jumps from batch {} to {number}",
                        self.batches
                    )));
                }
                self.check(&writes)
                    .map_err(|e| StoreError::Corrupt(format!("journal batch {number}: {e}")))?;
                self.apply_all(writes);
            }
            offset = body_start + length;
        }
        Ok(offset)
    }
}

/// Open journal plus the bookkeeping that drives compaction.
struct Journal {
    snapshot_path: PathBuf,
    log_path: PathBuf,
    log: File,
    log_len: u64,
    snapshot_len: u64,
    compaction_bytes: u64,
}

impl Journal {
    fn append(&mut self, number: u64, writes: &[LedgerWrite]) -> Result<(), StoreError> {
        let payload =
            bincode::serialize(writes).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len())
            .map_err(|_| StoreError::Serialization("batch exceeds frame size".to_string()))?;

        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
        frame.extend_from_slice(&number.to_le_bytes());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&payload);

        if let Err(e) = self.log.write_all(&frame).and_then(|()| self.log.sync_data()) {
            // Cut off whatever part of the frame reached the file
            if let Err(cut) = self.log.set_len(self.log_len) {
                warn!(path = %self.log_path.display(), error = %cut, "Failed to trim journal");
            }
            return Err(io_error(e));
        }
        self.log_len += frame.len() as u64;
        Ok(())
    }

    fn wants_compaction(&self) -> bool {
        self.log_len > self.compaction_bytes.max(self.snapshot_len)
    }

    fn compact(&mut self, state: &LedgerState) -> Result<(), StoreError> {
        let bytes = snapshot::encode(LEDGER_MAGIC, state)?;
        snapshot::write_atomic(&self.snapshot_path, &bytes)?;
        self.snapshot_len = bytes.len() as u64;

        let header = LOG_MAGIC.len() as u64;
        self.log
            .set_len(header)
            .and_then(|()| self.log.sync_data())
            .map_err(io_error)?;
        self.log_len = header;
        debug!(
            path = %self.snapshot_path.display(),
            bytes = self.snapshot_len,
            batches = state.batches,
            "Compacted ledger journal"
        );
        Ok(())
    }
}

struct Inner {
    state: LedgerState,
    journal: Option<Journal>,
}

/// In-memory [`LedgerStore`].
///
/// Without a path the state lives only as long as the process.
pub struct InMemoryLedgerStore {
    inner: RwLock<Inner>,
}

impl InMemoryLedgerStore {
    /// Volatile store seeded with the given thresholds.
    pub fn new(params: RegistryParams) -> Self {
        Self {
            inner: RwLock::new(Inner {
                state: LedgerState::new(params),
                journal: None,
            }),
        }
    }

    /// Open a store persisted at `path`.
    ///
    /// Loads the snapshot when the file exists, otherwise writes an empty one
    /// holding `params`, then replays the journal on top of it.
    pub fn open(path: impl AsRef<Path>, params: RegistryParams) -> Result<Self, StoreError> {
        let snapshot_path = path.as_ref().to_path_buf();
        let log_path = snapshot_path.with_extension("log");

        let (mut state, snapshot_len) = if snapshot_path.exists() {
            let state: LedgerState = snapshot::read(LEDGER_MAGIC, &snapshot_path)?;
            let len = fs::metadata(&snapshot_path).map_err(io_error)?.len();
            (state, len)
        } else {
            // Pin the initial thresholds before any batch references them
            let state = LedgerState::new(params);
            let bytes = snapshot::encode(LEDGER_MAGIC, &state)?;
            snapshot::write_atomic(&snapshot_path, &bytes)?;
            debug!(path = %snapshot_path.display(), "Created empty ledger snapshot");
            (state, bytes.len() as u64)
        };

        let data = if log_path.exists() {
            fs::read(&log_path).map_err(io_error)?
        } else {
            Vec::new()
        };
        let valid_len = if data.len() < LOG_MAGIC.len() {
            0
        } else if data.starts_with(LOG_MAGIC) {
            state.replay(&data)?
        } else {
            return Err(StoreError::Corrupt("invalid journal magic".to_string()));
        };

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(io_error)?;
        if valid_len < data.len() {
            warn!(
                path = %log_path.display(),
                dropped = data.len() - valid_len,
                "Dropping torn journal tail"
            );
            log.set_len(valid_len as u64).map_err(io_error)?;
        }
        if valid_len == 0 {
            log.write_all(LOG_MAGIC).map_err(io_error)?;
        }
        log.sync_data().map_err(io_error)?;

        info!(
            path = %snapshot_path.display(),
            identities = state.identities.len(),
            events = state.events.len(),
            batches = state.batches,
            "Opened ledger"
        );
        Ok(Self {
            inner: RwLock::new(Inner {
                state,
                journal: Some(Journal {
                    snapshot_path,
                    log_path,
                    log,
                    log_len: valid_len.max(LOG_MAGIC.len()) as u64,
                    snapshot_len,
                    compaction_bytes: DEFAULT_COMPACTION_BYTES,
                }),
            }),
        })
    }

    /// Journal size that must be exceeded before compaction. The journal is
    /// also allowed to grow as large as the last snapshot.
    pub fn with_compaction_threshold(mut self, bytes: u64) -> Self {
        if let Some(journal) = self.inner.get_mut().journal.as_mut() {
            journal.compaction_bytes = bytes;
        }
        self
    }

    pub fn snapshot_path(&self) -> Option<PathBuf> {
        let inner = self.inner.read();
        inner.journal.as_ref().map(|j| j.snapshot_path.clone())
    }

    pub fn journal_path(&self) -> Option<PathBuf> {
        let inner = self.inner.read();
        inner.journal.as_ref().map(|j| j.log_path.clone())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn get_identity(&self, identity_key: &IdentityKey) -> Option<Identity> {
        self.inner.read().state.identities.get(identity_key).cloned()
    }

    fn identity_of(&self, owner: &Address) -> Option<IdentityKey> {
        self.inner.read().state.owners.get(owner).copied()
    }

    fn linked_platforms(&self, identity_key: &IdentityKey) -> Vec<String> {
        self.inner
            .read()
            .state
            .platforms
            .get(identity_key)
            .cloned()
            .unwrap_or_default()
    }

    fn vouches(&self, identity_key: &IdentityKey) -> Vec<Vouch> {
        self.inner
            .read()
            .state
            .vouches
            .get(identity_key)
            .cloned()
            .unwrap_or_default()
    }

    fn vouch_slot(&self, identity_key: &IdentityKey, voucher: &Address) -> Option<VouchSlot> {
        self.inner
            .read()
            .state
            .vouch_index
            .get(&(*identity_key, *voucher))
            .copied()
    }

    fn vouch_for(&self, identity_key: &IdentityKey, voucher: &Address) -> Option<Vouch> {
        let inner = self.inner.read();
        let VouchSlot(index) = *inner.state.vouch_index.get(&(*identity_key, *voucher))?;
        inner.state.vouches.get(identity_key)?.get(index).cloned()
    }

    fn identities(&self) -> Vec<Identity> {
        self.inner.read().state.identities.values().cloned().collect()
    }

    fn registration_nonce(&self) -> u64 {
        self.inner.read().state.registration_nonce
    }

    fn custodied(&self) -> Amount {
        self.inner.read().state.custodied
    }

    fn params(&self) -> RegistryParams {
        self.inner.read().state.params
    }

    fn last_event_sequence(&self) -> u64 {
        self.inner.read().state.last_event_sequence()
    }

    fn events_since(&self, after: u64, limit: usize) -> Vec<EventRecord> {
        let inner = self.inner.read();
        // Sequences are dense from 1, so `after` is also the index of the next record
        let start = usize::try_from(after).unwrap_or(usize::MAX);
        inner
            .state
            .events
            .get(start..)
            .unwrap_or_default()
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }

    fn commit(&self, batch: LedgerBatch) -> Result<(), StoreError> {
        let mut guard = self.inner.write();
        let Inner { state, journal } = &mut *guard;

        let writes = batch.into_writes();
        state.check(&writes)?;
        if let Some(journal) = journal.as_mut() {
            journal.append(state.batches + 1, &writes)?;
        }
        state.apply_all(writes);

        if let Some(journal) = journal.as_mut().filter(|j| j.wants_compaction()) {
            // The journal still holds every batch, so a failed compaction
            // costs disk space only
            if let Err(e) = journal.compact(state) {
                warn!(error = %e, "Ledger compaction failed");
            }
        }
        Ok(())
    }
}
