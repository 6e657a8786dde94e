//! Magic-prefixed bincode files
//!
//! Format: `[MAGIC (8 bytes)][bincode(T)]`. Files are replaced through a
//! temp file, fsync and rename, so readers see the old or the new content.

use crate::domain::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

pub(crate) fn io_error(e: std::io::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

pub(crate) fn encode<T: Serialize>(magic: &[u8; 8], value: &T) -> Result<Vec<u8>, StoreError> {
    let payload =
        bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let mut buf = Vec::with_capacity(magic.len() + payload.len());
    buf.extend_from_slice(magic);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode<T: DeserializeOwned>(magic: &[u8; 8], data: &[u8]) -> Result<T, StoreError> {
    let payload = data
        .strip_prefix(magic.as_slice())
        .ok_or_else(|| StoreError::Corrupt("invalid magic".to_string()))?;
    bincode::deserialize(payload).map_err(|e| StoreError::Corrupt(e.to_string()))
}

pub(crate) fn read<T: DeserializeOwned>(magic: &[u8; 8], path: &Path) -> Result<T, StoreError> {
    let data = fs::read(path).map_err(io_error)?;
    decode(magic, &data)
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp).map_err(io_error)?;
    file.write_all(bytes).map_err(io_error)?;
    file.sync_all().map_err(io_error)?;
    fs::rename(&tmp, path).map_err(io_error)?;
    Ok(())
}
